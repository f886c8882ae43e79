//! The acquisition pipeline.
//!
//! One pipeline for both sources: fetch with retries, extract, normalize,
//! build the table. The source only decides which transport/extractor pair
//! is plugged in.
//!
//! A rendered run borrows a browser for its whole duration; [`with_session`]
//! guarantees that browser is released exactly once, whatever the run returns.

use crate::cli::Source;
use crate::config::RunConfig;
use crate::extractors::api::ApiExtractor;
use crate::extractors::html::HtmlExtractor;
use crate::extractors::{ExtractError, Extractor};
use crate::fetch::{fetch_with_retry, Transport};
use crate::models::{RankingTable, RawPayload};
use crate::normalize::normalize;
use crate::transports::api::ApiTransport;
use crate::transports::page::{BrowserSession, PageTransport};
use crate::utils::truncate_for_log;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info, instrument};

fn preview(payload: &RawPayload) -> String {
    match payload {
        RawPayload::Json(value) => truncate_for_log(&value.to_string(), 300),
        RawPayload::Html(html) => truncate_for_log(html, 300),
    }
}

/// A resource held for one run and released when the run ends.
pub trait Session {
    async fn close(self);
}

impl Session for BrowserSession {
    async fn close(self) {
        BrowserSession::close(self).await
    }
}

/// Run `run` against `session`, then close the session.
///
/// The session is closed before the result is handed back, so callers can
/// propagate errors from `run` without leaking it.
pub async fn with_session<S, R>(session: S, run: impl AsyncFnOnce(&S) -> R) -> R
where
    S: Session,
{
    let result = run(&session).await;
    session.close().await;
    result
}

/// Fetch `target` and turn the payload into a ranking table.
///
/// # Returns
///
/// - `Ok(Some(table))` on success
/// - `Ok(None)` when the retry budget was exhausted
/// - `Err(_)` when the payload did not have the expected structure
#[instrument(level = "info", skip(transport, extractor))]
pub async fn acquire<T, E>(
    target: &str,
    transport: T,
    extractor: &E,
    max_attempts: usize,
    retry_delay: Duration,
) -> Result<Option<RankingTable>, ExtractError>
where
    T: Transport,
    E: Extractor,
{
    let Some(payload) = fetch_with_retry(target, transport, max_attempts, retry_delay).await else {
        error!(max_attempts, "Could not fetch ranking; giving up on this run");
        return Ok(None);
    };

    let raw = extractor.extract(&payload).inspect_err(|e| {
        error!(error = %e, payload = %preview(&payload), "Ranking payload could not be extracted");
    })?;

    let table = RankingTable::build(raw.iter().map(normalize).collect());
    info!(rows = table.len(), "Built ranking table");
    Ok(Some(table))
}

/// Run the pipeline against the chosen source.
///
/// For [`Source::Page`] the browser session lives only for this call and is
/// closed through [`with_session`] before the result is inspected.
pub async fn fetch_table(
    source: Source,
    config: &RunConfig,
    chrome_path: Option<String>,
) -> Result<Option<RankingTable>, Box<dyn Error>> {
    match source {
        Source::Api => {
            let transport = ApiTransport::new(&config.user_agent, config.request_timeout())?;
            let table = acquire(
                &config.api_url,
                transport,
                &ApiExtractor,
                config.max_attempts,
                config.retry_delay(),
            )
            .await?;
            Ok(table)
        }
        Source::Page => {
            let session = BrowserSession::launch(&config.browser(chrome_path)).await?;
            let result = with_session(session, async |session: &BrowserSession| {
                acquire(
                    &config.page_url,
                    PageTransport::new(session, config.settle()),
                    &HtmlExtractor::new(),
                    config.max_attempts,
                    config.retry_delay(),
                )
                .await
            })
            .await;
            Ok(result?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::TransportError;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixed(RawPayload);

    impl Transport for Fixed {
        async fn fetch(&self, _target: &str) -> Result<RawPayload, TransportError> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    impl Transport for Down {
        async fn fetch(&self, _target: &str) -> Result<RawPayload, TransportError> {
            Err(TransportError::Automation("browser crashed".to_string()))
        }
    }

    /// Counts how often it was closed.
    struct Counted(Rc<Cell<usize>>);

    impl Session for Counted {
        async fn close(self) {
            self.0.set(self.0.get() + 1);
        }
    }

    async fn run_in_session<T: Transport>(
        transport: T,
        extractor: &impl Extractor,
    ) -> (Result<Option<RankingTable>, ExtractError>, usize) {
        let closes = Rc::new(Cell::new(0));
        let result = with_session(Counted(Rc::clone(&closes)), async |_session: &Counted| {
            acquire("x", transport, extractor, 3, Duration::from_secs(2)).await
        })
        .await;
        (result, closes.get())
    }

    fn api_payload(n: i64) -> RawPayload {
        let list: Vec<_> = (1..=n)
            .map(|i| {
                json!({
                    "title": format!("视频{i}"),
                    "bvid": format!("BV{i}"),
                    "owner": { "name": "up" },
                    "stat": { "view": i, "danmaku": 0, "coin": 0, "like": 0, "share": 0, "favorite": 0 }
                })
            })
            .collect();
        RawPayload::Json(json!({ "data": { "list": list } }))
    }

    #[tokio::test]
    async fn test_acquire_api_payload() {
        let table = acquire("x", Fixed(api_payload(3)), &ApiExtractor, 5, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(table.len(), 3);
        let ranks: Vec<u32> = table.records().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(table.has_extended_metrics());
    }

    #[tokio::test]
    async fn test_acquire_html_payload() {
        let html = r#"<div class="rank-item"><a href="/video/BV1" class="title">t</a>
            <div class="detail-state"><span class="data-box">12.3万</span><span class="data-box">5</span></div></div>"#;
        let table = acquire(
            "x",
            Fixed(RawPayload::Html(html.to_string())),
            &HtmlExtractor::new(),
            5,
            Duration::ZERO,
        )
        .await
        .unwrap()
        .unwrap();

        let record = &table.records()[0];
        assert_eq!(record.view_count, 123_000);
        assert_eq!(record.danmaku_count, 5);
        assert_eq!(record.url, "https://www.bilibili.com/video/BV1");
        assert!(record.extended.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_exhausted_is_none() {
        let result = acquire("x", Down, &HtmlExtractor::new(), 3, Duration::from_secs(2)).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_acquire_bad_structure_is_error() {
        let payload = RawPayload::Json(json!({ "code": -400 }));
        let result = acquire("x", Fixed(payload), &ApiExtractor, 5, Duration::ZERO).await;
        assert!(matches!(result, Err(ExtractError::Structure(_))));
    }

    #[tokio::test]
    async fn test_session_closed_once_on_success() {
        let (result, closes) = run_in_session(Fixed(api_payload(2)), &ApiExtractor).await;
        assert!(matches!(result, Ok(Some(ref table)) if table.len() == 2));
        assert_eq!(closes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_closed_once_when_exhausted() {
        let (result, closes) = run_in_session(Down, &HtmlExtractor::new()).await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(closes, 1);
    }

    #[tokio::test]
    async fn test_session_closed_once_on_extract_error() {
        let payload = RawPayload::Json(json!({ "code": -400 }));
        let (result, closes) = run_in_session(Fixed(payload), &ApiExtractor).await;
        assert!(matches!(result, Err(ExtractError::Structure(_))));
        assert_eq!(closes, 1);
    }
}
