//! Retrying fetch client.
//!
//! This module provides the acquisition seam of the pipeline. Every source is
//! reached through a [`Transport`], and [`Retrying`] wraps any transport with a
//! bounded retry-with-delay policy.
//!
//! # Architecture
//!
//! - [`Transport`]: Core trait defining one fetch attempt
//! - [`Retrying`]: Decorator that retries any `Transport` a fixed number of times
//! - [`fetch_with_retry`]: Entry point that turns exhaustion into `None`
//!
//! # Retry Strategy
//!
//! - Maximum 5 attempts by default
//! - Fixed 2 second delay between attempts
//! - No delay after the last attempt

use crate::models::RawPayload;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// A failure of a single fetch attempt. All variants are retried.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("could not decode response body: {0}")]
    Decode(String),
    #[error("browser automation failed: {0}")]
    Automation(String),
}

/// One way of reaching a ranking source.
///
/// Implementors perform exactly one attempt; retrying is layered on by [`Retrying`].
pub trait Transport {
    /// Fetch `target` once.
    async fn fetch(&self, target: &str) -> Result<RawPayload, TransportError>;
}

/// Wrapper that adds a fixed-delay retry policy to any [`Transport`].
pub struct Retrying<T> {
    inner: T,
    max_attempts: usize,
    delay: Duration,
}

impl<T> Retrying<T>
where
    T: Transport,
{
    /// Wrap `inner`. A `max_attempts` of zero still makes one attempt.
    pub fn new(inner: T, max_attempts: usize, delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl<T> fmt::Debug for Retrying<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl<T> Transport for Retrying<T>
where
    T: Transport,
{
    #[instrument(level = "info", skip_all, fields(%target))]
    async fn fetch(&self, target: &str) -> Result<RawPayload, TransportError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            attempt += 1;
            match self.inner.fetch(target).await {
                Ok(payload) => {
                    info!(
                        attempt,
                        kind = payload.kind(),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "fetch succeeded"
                    );
                    return Ok(payload);
                }
                Err(e) => {
                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        delay = ?self.delay,
                        error = %e,
                        "fetch attempt failed; retrying"
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}

/// Fetch `target` through `transport`, retrying on any transport failure.
///
/// # Returns
///
/// The payload of the first successful attempt, or `None` once
/// `max_attempts` attempts have failed. Errors never cross this boundary;
/// they are logged instead.
pub async fn fetch_with_retry<T: Transport>(
    target: &str,
    transport: T,
    max_attempts: usize,
    delay: Duration,
) -> Option<RawPayload> {
    let client = Retrying::new(transport, max_attempts, delay);
    client.fetch(target).await.ok()
}
