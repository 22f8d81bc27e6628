//! REST source for race status and track geometry

use std::time::Duration;
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::provider::{ApiSource, TrackSelector};
use crate::types::{RaceStatus, TrackGeometry};
use crate::{Result, TelemetryError};

pub const STATUS_PATH: &str = "/api/status";

/// Fetches JSON documents from the SilverWall backend with reqwest.
///
/// Every request is bounded by the configured timeout. Bodies are validated into
/// typed values before they leave this module.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::request_failed(base_url.clone(), e))?;
        Ok(Self { client, base_url, timeout })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the body of a 2xx response
    async fn get_text(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        trace!(%url, "GET");

        let response = self.client.get(&url).send().await.map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "Request rejected");
            return Err(TelemetryError::Http { url, status: status.as_u16() });
        }

        response.text().await.map_err(|e| self.classify(&url, e))
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> TelemetryError {
        if error.is_timeout() {
            TelemetryError::Timeout { duration: self.timeout }
        } else {
            TelemetryError::request_failed(url, error)
        }
    }
}

#[async_trait::async_trait]
impl ApiSource for HttpSource {
    async fn fetch_status(&self) -> Result<RaceStatus> {
        let body = self.get_text(STATUS_PATH).await?;
        RaceStatus::from_json(&body)
    }

    async fn fetch_track(&self, selector: &TrackSelector) -> Result<TrackGeometry> {
        let body = self.get_text(&selector.path()).await?;
        TrackGeometry::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let source = HttpSource::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpSource::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let error = source.fetch_status().await.unwrap_err();
        assert!(
            matches!(error, TelemetryError::Request { .. } | TelemetryError::Timeout { .. }),
            "unexpected error: {error}"
        );
    }
}
