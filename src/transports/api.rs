//! Direct-request transport for the structured ranking endpoint.
//!
//! The remote service rejects requests without a browser-like `User-Agent`,
//! so the header is set on the client once. Every request carries a timeout:
//! a stalled response has to fail the attempt for the retry budget to run out.

use crate::fetch::{Transport, TransportError};
use crate::models::RawPayload;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default upper bound on one request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport returning the decoded JSON body.
#[derive(Debug, Clone)]
pub struct ApiTransport {
    client: Client,
}

impl ApiTransport {
    /// Build a transport that identifies itself with `user_agent` and gives
    /// up on a request after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(user_agent)
            .map_err(|e| TransportError::Decode(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ApiTransport {
    #[instrument(level = "debug", skip_all, fields(%target))]
    async fn fetch(&self, target: &str) -> Result<RawPayload, TransportError> {
        let response = self.client.get(target).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Ranking API returned non-success status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: target.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Received ranking API body");
        let value = serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(RawPayload::Json(value))
    }
}
