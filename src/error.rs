//! Error types for telemetry ingestion.
//!
//! Every failure inside the ingestion pipeline is represented by [`TelemetryError`].
//! Errors are returned by the transport and source seams, logged by the owning task,
//! and then folded into status values ([`ConnectionStatus`](crate::ConnectionStatus),
//! [`RaceStatus`](crate::RaceStatus), [`TrackState`](crate::TrackState)). They never
//! reach the view-models directly.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: the streaming transport could not be opened or failed
//! - **HTTP Errors**: non-2xx responses and request failures from the REST API
//! - **Parse Errors**: payloads that fail validation at the ingestion boundary
//! - **Backend Errors**: well-formed bodies in which the backend reports an error
//! - **Config Errors**: invalid environment configuration
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use silverwall::TelemetryError;
//!
//! let error = TelemetryError::connection_failed("handshake refused");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Failed to connect to telemetry stream: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Backend reported an error: {message}")]
    Backend { message: String },

    #[error("Invalid configuration for {key}: {details}")]
    Config { key: String, details: String },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Connection { .. } => true,
            TelemetryError::Http { status, .. } => *status >= 500 || *status == 429,
            TelemetryError::Request { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::Parse { .. } => false,
            TelemetryError::Backend { .. } => false,
            TelemetryError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::Connection { .. } => vec![
                "Check that the telemetry backend is running",
                "Verify SILVERWALL_WS_URL points at the backend",
                "Check network connectivity and proxies",
            ],
            TelemetryError::Http { .. } => vec![
                "Check the backend logs for the failing route",
                "Verify SILVERWALL_API_URL points at the backend",
            ],
            TelemetryError::Request { .. } => vec![
                "Check network connectivity",
                "Verify the backend host resolves and accepts connections",
                "Increase SILVERWALL_API_TIMEOUT_MS on slow links",
            ],
            TelemetryError::Parse { .. } => vec![
                "Check backend and client versions are compatible",
                "Inspect the raw payload for missing fields",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Increase the request timeout",
                "Check backend responsiveness",
            ],
            TelemetryError::Backend { .. } => vec![
                "Check that the backend database has been seeded",
                "Verify the requested circuit identifier",
            ],
            TelemetryError::Config { .. } => vec![
                "Check SILVERWALL_* environment variables",
                "Remove invalid overrides to fall back to defaults",
            ],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for payload validation errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for failed HTTP requests.
    pub fn request_failed(url: impl Into<String>, source: reqwest::Error) -> Self {
        TelemetryError::Request { url: url.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(key: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Config { key: key.into(), details: details.into() }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Parse { context: "json".to_string(), details: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            reason in ".*",
            details in ".*",
            status in 100u16..600u16,
        ) {
            let connection = TelemetryError::connection_failed(reason.clone());
            prop_assert!(connection.to_string().contains(&reason));

            let parse = TelemetryError::parse_error("stream message", details.clone());
            prop_assert!(parse.to_string().contains(&details));

            let http = TelemetryError::Http { url: "http://host/api/status".into(), status };
            prop_assert!(http.to_string().contains(&status.to_string()));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();

        let error = TelemetryError::connection_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(TelemetryError::connection_failed("refused").is_retryable());
        assert!(TelemetryError::Timeout { duration: Duration::from_secs(1) }.is_retryable());
        assert!(TelemetryError::Http { url: "u".into(), status: 503 }.is_retryable());
        assert!(!TelemetryError::Http { url: "u".into(), status: 404 }.is_retryable());
        assert!(!TelemetryError::parse_error("frame", "missing cars").is_retryable());
        assert!(!TelemetryError::invalid_config("SILVERWALL_API_URL", "empty").is_retryable());
    }

    #[test]
    fn every_variant_has_suggestions() {
        let errors = [
            TelemetryError::connection_failed("x"),
            TelemetryError::Http { url: "u".into(), status: 500 },
            TelemetryError::parse_error("c", "d"),
            TelemetryError::Timeout { duration: Duration::from_millis(10) },
            TelemetryError::Backend { message: "no track".into() },
            TelemetryError::invalid_config("k", "v"),
        ];
        for error in errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let converted: TelemetryError = err.into();
        assert!(matches!(converted, TelemetryError::Parse { .. }));
    }

    #[test]
    fn connection_error_preserves_source_chain() {
        let inner = std::io::Error::other("connection reset");
        let err = TelemetryError::connection_failed_with_source("handshake", Box::new(inner));
        let source = std::error::Error::source(&err).expect("source should be kept");
        assert!(source.to_string().contains("connection reset"));
    }
}
