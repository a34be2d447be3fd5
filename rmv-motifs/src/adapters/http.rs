//! Shared HTTP client for web sources
//!
//! One `reqwest` client per adapter with a fixed User-Agent and request
//! timeout. Certificate validation is disabled.

use crate::types::SourceError;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Thin wrapper mapping HTTP outcomes onto [`SourceError`]
#[derive(Debug, Clone)]
pub struct WebClient {
    client: Client,
}

impl WebClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let mut headers = header::HeaderMap::new();
        let agent = header::HeaderValue::from_str(user_agent)
            .map_err(|e| SourceError::Internal(format!("Invalid User-Agent: {}", e)))?;
        headers.insert(header::USER_AGENT, agent);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| SourceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET a text body
    ///
    /// 404 → `NotFound`; any other non-success status → `Http`; transport
    /// failures (connect, timeout, body read) → `Unreachable`.
    pub async fn get_text(&self, url: &str, accept: &str) -> Result<String, SourceError> {
        debug!(url = %url, "HTTP GET");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| SourceError::Unreachable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Unreachable(format!("{}: body read failed: {}", url, e)))
    }
}

/// Join a base URL and a path segment with exactly one '/'
pub fn join_url(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://h/a/", "/1S72/motifs"), "https://h/a/1S72/motifs");
        assert_eq!(join_url("https://h/a", "1S72"), "https://h/a/1S72");
    }

    #[test]
    fn test_client_builds_with_default_agent() {
        assert!(WebClient::new("RNA-Motif-Visualizer/3.0", Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_invalid_agent_rejected() {
        assert!(matches!(
            WebClient::new("bad\nagent", Duration::from_secs(1)),
            Err(SourceError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_unreachable() {
        let client = WebClient::new("test", Duration::from_millis(500)).unwrap();
        // Port 9 on localhost: connection refused
        let result = client.get_text("http://127.0.0.1:9/x", "text/plain").await;
        assert!(matches!(result, Err(SourceError::Unreachable(_))));
    }
}
