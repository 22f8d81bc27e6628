//! Client configuration, read once at startup

use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::poller::PollerConfig;
use crate::retry::RetryPolicy;
use crate::{Result, TelemetryError};

pub const ENV_API_URL: &str = "SILVERWALL_API_URL";
pub const ENV_WS_URL: &str = "SILVERWALL_WS_URL";
pub const ENV_API_TIMEOUT_MS: &str = "SILVERWALL_API_TIMEOUT_MS";
pub const ENV_WS_MAX_RETRIES: &str = "SILVERWALL_WS_MAX_RETRIES";
pub const ENV_POLL_INTERVAL_SECS: &str = "SILVERWALL_POLL_INTERVAL_SECS";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_WS_URL: &str = "ws://localhost:8000";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const MIN_TIMEOUT_MS: u64 = 1_000;
const DEFAULT_MAX_RETRIES: u32 = 10;
const DEFAULT_POLL_SECS: u64 = 30;

/// Endpoints and timing for the live pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// REST base URL, without trailing slash
    pub api_url: String,

    /// WebSocket base URL, without any `/ws/...` path
    pub ws_url: String,

    /// Stream path appended to `ws_url`
    pub stream_path: String,

    /// Bound on every REST request and on the WebSocket handshake
    pub request_timeout: Duration,

    /// Race status polling period
    pub poll_interval: Duration,

    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            stream_path: "/ws/live".to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Read configuration from `SILVERWALL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unset or blank keys take
    /// their defaults; present but invalid values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = get(ENV_API_URL) {
            config.api_url = validate_url(ENV_API_URL, &url, &["http", "https"])?;
        }

        if let Some(url) = get(ENV_WS_URL) {
            let url = validate_url(ENV_WS_URL, &url, &["ws", "wss"])?;
            config.ws_url = strip_ws_path(&url);
        }

        if let Some(raw) = get(ENV_API_TIMEOUT_MS) {
            let ms: u64 = parse_number(ENV_API_TIMEOUT_MS, &raw)?;
            if ms < MIN_TIMEOUT_MS {
                return Err(TelemetryError::invalid_config(
                    ENV_API_TIMEOUT_MS,
                    format!("must be at least {MIN_TIMEOUT_MS} ms, got {ms}"),
                ));
            }
            config.request_timeout = Duration::from_millis(ms);
        }

        let max_retries = match get(ENV_WS_MAX_RETRIES) {
            Some(raw) => parse_number(ENV_WS_MAX_RETRIES, &raw)?,
            None => DEFAULT_MAX_RETRIES,
        };
        if max_retries == 0 {
            return Err(TelemetryError::invalid_config(ENV_WS_MAX_RETRIES, "must be at least 1"));
        }
        config.retry = config.retry.with_max_attempts(Some(max_retries));

        if let Some(raw) = get(ENV_POLL_INTERVAL_SECS) {
            let secs: u64 = parse_number(ENV_POLL_INTERVAL_SECS, &raw)?;
            if secs == 0 {
                return Err(TelemetryError::invalid_config(
                    ENV_POLL_INTERVAL_SECS,
                    "must be at least 1",
                ));
            }
            config.poll_interval = Duration::from_secs(secs);
        }

        debug!(
            api_url = %config.api_url,
            ws_url = %config.ws_url,
            timeout_ms = config.request_timeout.as_millis() as u64,
            max_retries,
            "Loaded client configuration"
        );
        Ok(config)
    }

    /// Full URL of the live telemetry stream
    pub fn stream_endpoint(&self) -> String {
        format!("{}{}", self.ws_url, self.stream_path)
    }

    /// Full URL of a REST path such as `/api/status`
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig { interval: self.poll_interval, request_timeout: self.request_timeout }
    }
}

/// Parse `url` fully; a bad port or host is a configuration error
fn validate_url(key: &str, url: &str, schemes: &[&str]) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| TelemetryError::invalid_config(key, format!("invalid URL {url:?}: {e}")))?;

    if !schemes.contains(&parsed.scheme()) {
        return Err(TelemetryError::invalid_config(
            key,
            format!("expected a {} URL, got {url:?}", schemes.join(" or ")),
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(TelemetryError::invalid_config(key, "missing host"));
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// Drop a `/ws` or `/ws/...` path after the host, keeping any other path
fn strip_ws_path(url: &str) -> String {
    let host_start = url.find("://").map_or(0, |i| i + 3);
    let (base, path) = match url[host_start..].find('/') {
        Some(i) => url.split_at(host_start + i),
        None => return url.to_string(),
    };

    match path.find("/ws") {
        Some(i) if path[i + 3..].is_empty() || path[i + 3..].starts_with('/') => {
            format!("{base}{}", &path[..i])
        }
        _ => url.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| TelemetryError::invalid_config(key, format!("not a valid number: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ClientConfig> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.stream_endpoint(), "ws://localhost:8000/ws/live");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, Some(10));
    }

    #[test]
    fn strips_trailing_stream_path() {
        let config = config_from(&[(ENV_WS_URL, "wss://silverwall.example/ws/live")]).unwrap();
        assert_eq!(config.ws_url, "wss://silverwall.example");
        assert_eq!(config.stream_endpoint(), "wss://silverwall.example/ws/live");

        let config = config_from(&[(ENV_WS_URL, "ws://host:9000/ws")]).unwrap();
        assert_eq!(config.ws_url, "ws://host:9000");

        let config = config_from(&[(ENV_WS_URL, "ws://host/proxy/ws/live/")]).unwrap();
        assert_eq!(config.ws_url, "ws://host/proxy");

        let config = config_from(&[(ENV_WS_URL, "ws://wshost:9000")]).unwrap();
        assert_eq!(config.ws_url, "ws://wshost:9000");

        let config = config_from(&[(ENV_WS_URL, "ws://host/wsx")]).unwrap();
        assert_eq!(config.ws_url, "ws://host/wsx");
    }

    #[test]
    fn api_url_trailing_slash_removed() {
        let config = config_from(&[(ENV_API_URL, "https://api.example/")]).unwrap();
        assert_eq!(config.api_endpoint("/api/status"), "https://api.example/api/status");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let cases: &[(&str, &str)] = &[
            (ENV_API_URL, "ftp://nope"),
            (ENV_WS_URL, "http://wrong-scheme"),
            (ENV_WS_URL, "ws://host:notaport"),
            (ENV_WS_URL, "ws://"),
            (ENV_API_URL, "http://[::1"),
            (ENV_API_URL, "localhost:8000"),
            (ENV_API_TIMEOUT_MS, "500"),
            (ENV_API_TIMEOUT_MS, "soon"),
            (ENV_WS_MAX_RETRIES, "0"),
            (ENV_POLL_INTERVAL_SECS, "0"),
            (ENV_POLL_INTERVAL_SECS, "-5"),
        ];
        for (key, value) in cases {
            match config_from(&[(key, value)]) {
                Err(TelemetryError::Config { key: reported, .. }) => assert_eq!(reported, *key),
                other => panic!("{key}={value} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_values_take_defaults() {
        let config = config_from(&[(ENV_API_URL, "  "), (ENV_API_TIMEOUT_MS, "")]).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn overrides_apply() {
        let config = config_from(&[
            (ENV_API_TIMEOUT_MS, "2500"),
            (ENV_WS_MAX_RETRIES, "3"),
            (ENV_POLL_INTERVAL_SECS, "5"),
        ])
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.retry.max_attempts, Some(3));
        assert_eq!(config.poller_config().interval, Duration::from_secs(5));
    }
}
