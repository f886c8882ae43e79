//! Rendered-page transport using headless Chrome/Chromium.
//!
//! The ranking page builds its list client-side, so the document has to be
//! rendered in a real browser before it can be read. A [`BrowserSession`]
//! owns the browser process for one run; [`PageTransport`] borrows it.
//!
//! # Lifecycle
//!
//! The session is launched at the start of a rendered run and must be
//! released with [`BrowserSession::close`] on every exit path. Dropping an
//! unclosed session still kills the browser process.

use crate::fetch::{Transport, TransportError};
use crate::models::RawPayload;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Default time to let client-side rendering settle after navigation.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(3);

/// Browser launch options.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Path to Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    /// Upper bound on a single CDP request.
    pub request_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            window_width: 1920,
            window_height: 1080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

fn automation(e: impl std::fmt::Display) -> TransportError {
    TransportError::Automation(e.to_string())
}

/// A headless browser owned by one run.
pub struct BrowserSession {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    closed: bool,
}

impl BrowserSession {
    /// Launch a headless browser.
    #[instrument(level = "info", skip_all)]
    pub async fn launch(options: &BrowserOptions) -> Result<Self, TransportError> {
        info!("Launching headless browser");

        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .request_timeout(options.request_timeout)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--mute-audio");

        if let Some(ref chrome_path) = options.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        let config = builder
            .build()
            .map_err(|e| automation(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(automation)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        info!("Headless browser ready");
        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            closed: false,
        })
    }

    /// Release the browser. Consumes the session so it cannot be reused.
    #[instrument(level = "info", skip_all)]
    pub async fn close(mut self) {
        self.mark_closed();
        let browser = self.browser.get_mut();
        if let Err(e) = browser.close().await {
            error!(error = %e, "Failed to close browser");
        }
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Failed to wait for browser exit");
        }
        info!("Browser session closed");
    }

    fn mark_closed(&mut self) {
        self.closed = true;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if !self.closed {
            warn!("Browser session dropped without close; killing browser process");
        }
    }
}

/// Transport that renders the target in the session's browser and returns the DOM.
pub struct PageTransport<'a> {
    session: &'a BrowserSession,
    settle: Duration,
}

impl<'a> PageTransport<'a> {
    pub fn new(session: &'a BrowserSession, settle: Duration) -> Self {
        Self { session, settle }
    }
}

impl Transport for PageTransport<'_> {
    #[instrument(level = "debug", skip_all, fields(%target))]
    async fn fetch(&self, target: &str) -> Result<RawPayload, TransportError> {
        // Held for the whole navigation; one page at a time.
        let browser = self.session.browser.lock().await;
        let page = browser.new_page(target).await.map_err(automation)?;

        let rendered: Result<String, CdpError> = async {
            page.wait_for_navigation().await?;
            sleep(self.settle).await;
            page.content().await
        }
        .await;

        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close page");
        }

        let html = rendered.map_err(automation)?;
        debug!(bytes = html.len(), "Rendered ranking page");
        Ok(RawPayload::Html(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_options_default() {
        let options = BrowserOptions::default();
        assert!(options.chrome_path.is_none());
        assert_eq!((options.window_width, options.window_height), (1920, 1080));
        assert_eq!(DEFAULT_SETTLE, Duration::from_secs(3));
    }

    #[test]
    fn test_automation_error_message() {
        let err = automation("navigation timed out");
        assert_eq!(err.to_string(), "browser automation failed: navigation timed out");
    }
}
