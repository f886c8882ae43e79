//! Run configuration.
//!
//! Every setting has a default, so the YAML file is optional and may set any
//! subset of keys:
//!
//! ```yaml
//! api_url: https://api.bilibili.com/x/web-interface/ranking/v2?rid=0&type=all
//! max_attempts: 3
//! retry_delay_secs: 5
//! ```

use crate::analytics::{AnalyticsOptions, DEFAULT_TOP_K, DEFAULT_TOP_N, DEFAULT_WRAP_WIDTH};
use crate::fetch::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::transports::api::DEFAULT_REQUEST_TIMEOUT;
use crate::transports::page::{BrowserOptions, DEFAULT_SETTLE};
use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_API_URL: &str = "https://api.bilibili.com/x/web-interface/ranking/v2?rid=0&type=all";
pub const DEFAULT_PAGE_URL: &str = "https://www.bilibili.com/ranking";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Structured ranking endpoint, category and type included.
    pub api_url: String,
    /// Browsable ranking page.
    pub page_url: String,
    pub user_agent: String,
    /// Upper bound on one API request, connect to last body byte.
    pub request_timeout_secs: u64,
    pub max_attempts: usize,
    pub retry_delay_secs: u64,
    /// Wait after navigation before reading the rendered page.
    pub settle_secs: u64,
    pub top_k: usize,
    pub top_n: usize,
    pub wrap_width: usize,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        let browser = BrowserOptions::default();
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_url: DEFAULT_PAGE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY.as_secs(),
            settle_secs: DEFAULT_SETTLE.as_secs(),
            top_k: DEFAULT_TOP_K,
            top_n: DEFAULT_TOP_N,
            wrap_width: DEFAULT_WRAP_WIDTH,
            window_width: browser.window_width,
            window_height: browser.window_height,
        }
    }
}

impl RunConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn analytics(&self) -> AnalyticsOptions {
        AnalyticsOptions {
            top_k: self.top_k,
            top_n: self.top_n,
            wrap_width: self.wrap_width,
        }
    }

    pub fn browser(&self, chrome_path: Option<String>) -> BrowserOptions {
        BrowserOptions {
            chrome_path,
            window_width: self.window_width,
            window_height: self.window_height,
            ..BrowserOptions::default()
        }
    }
}

/// Load the configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&Path>) -> Result<RunConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = tokio::fs::read_to_string(path).await?;
    let config: RunConfig = serde_yaml::from_str(&text)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: RunConfig = serde_yaml::from_str("max_attempts: 3\nsettle_secs: 1\n").unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.settle(), Duration::from_secs(1));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.top_k, 100);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.settle(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.browser(None).window_width, 1920);
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "page_url: http://localhost/ranking\ntop_n: 5\n")
            .await
            .unwrap();

        let config = load_config(Some(path.as_path())).await.unwrap();
        assert_eq!(config.page_url, "http://localhost/ranking");
        assert_eq!(config.analytics().top_n, 5);
    }

    #[tokio::test]
    async fn test_load_config_without_path() {
        assert_eq!(load_config(None).await.unwrap(), RunConfig::default());
    }
}
