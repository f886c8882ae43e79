//! Extractor for the rendered ranking page.
//!
//! Every `.rank-item` element is one entry. Sub-elements are optional: a
//! missing title, link, author or counter is replaced by a sentinel instead of
//! dropping the entry. An entry whose link is present but unusable is skipped
//! and does not take a rank.
//!
//! The selectors match the page markup at the time of writing; there is no
//! fallback when the upstream layout changes.

use super::{ExtractError, Extractor};
use crate::models::{
    Field, RawPayload, RawRecord, UNKNOWN_AUTHOR, UNKNOWN_TITLE, UNKNOWN_URL,
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Base used to resolve relative and protocol-relative links.
pub const SITE_BASE: &str = "https://www.bilibili.com";
/// Counter text substituted when a stat element is missing.
const ZERO: &str = "0";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static ITEM: Lazy<Selector> = Lazy::new(|| selector(".rank-item"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector(".title"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| selector(".up-name"));
static VIEWS: Lazy<Selector> = Lazy::new(|| selector(".detail-state .data-box:nth-of-type(1)"));
static DANMAKU: Lazy<Selector> = Lazy::new(|| selector(".detail-state .data-box:nth-of-type(2)"));

fn text_of(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

/// Selects `.rank-item` entries from a rendered ranking page.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    base: Url,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self::with_base(Url::parse(SITE_BASE).unwrap())
    }

    /// Resolve links against `base` instead of the live site.
    pub fn with_base(base: Url) -> Self {
        Self { base }
    }

    fn link_of(&self, item: ElementRef<'_>) -> Result<String, ExtractError> {
        let Some(anchor) = item.select(&LINK).next() else {
            return Ok(UNKNOWN_URL.to_string());
        };
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| ExtractError::Element("link has no href".to_string()))?;
        let resolved = self
            .base
            .join(href)
            .map_err(|e| ExtractError::Element(format!("unresolvable href {href:?}: {e}")))?;
        Ok(resolved.to_string())
    }

    fn extract_item(&self, item: ElementRef<'_>, rank: u32) -> Result<RawRecord, ExtractError> {
        let title = text_of(item, &TITLE).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let url = self.link_of(item)?;
        let author = text_of(item, &AUTHOR).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let views = text_of(item, &VIEWS).unwrap_or_else(|| ZERO.to_string());
        let danmaku = text_of(item, &DANMAKU).unwrap_or_else(|| ZERO.to_string());

        Ok(RawRecord::new(rank)
            .with(Field::Title, title)
            .with(Field::Url, url)
            .with(Field::Author, author)
            .with(Field::View, views)
            .with(Field::Danmaku, danmaku))
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for HtmlExtractor {
    #[instrument(level = "info", skip_all)]
    fn extract(&self, payload: &RawPayload) -> Result<Vec<RawRecord>, ExtractError> {
        let RawPayload::Html(html) = payload else {
            return Err(ExtractError::UnexpectedPayload {
                expected: "html",
                actual: payload.kind(),
            });
        };

        let document = Html::parse_document(html);
        let items: Vec<ElementRef<'_>> = document.select(&ITEM).collect();
        info!(matched = items.len(), "Matched rank-item elements");

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let rank = records.len() as u32 + 1;
            match self.extract_item(item, rank) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(index, error = %e, "Skipping ranking item");
                }
            }
        }

        debug!(count = records.len(), "Extracted ranking page entries");
        Ok(records)
    }
}
