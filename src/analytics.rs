//! Text analytics over a ranking table.
//!
//! Drives the two analytic views:
//! - a word cloud of the keywords found in all titles
//! - a horizontal bar chart of the most-viewed entries
//!
//! Keyword extraction and rendering sit behind [`KeywordExtractor`],
//! [`WordCloudRenderer`] and [`BarChartRenderer`] so the driver can be run
//! against any backend. The defaults are jieba TF-IDF and the SVG renderers
//! in [`crate::outputs::charts`].

use crate::models::{RankingRecord, RankingTable};
use itertools::Itertools;
use jieba_rs::{Jieba, KeywordExtract, TfIdf};
use std::cmp::Reverse;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_TOP_K: usize = 100;
pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_WRAP_WIDTH: usize = 20;

/// Pulls the most significant words out of a block of text.
pub trait KeywordExtractor {
    fn keywords(&self, text: &str, top_k: usize) -> Vec<String>;
}

pub trait WordCloudRenderer {
    fn render_word_cloud(&self, keywords: &[String]) -> Result<(), Box<dyn Error>>;
}

pub trait BarChartRenderer {
    fn render_bar_chart(&self, bars: &[Bar]) -> Result<(), Box<dyn Error>>;
}

/// One bar of the top-N chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    /// Title wrapped for display.
    pub label_lines: Vec<String>,
    pub value: u64,
}

/// Chinese keyword extraction with jieba's TF-IDF ranking.
pub struct JiebaKeywords {
    jieba: Jieba,
    tfidf: TfIdf,
}

impl JiebaKeywords {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
            tfidf: TfIdf::default(),
        }
    }
}

impl Default for JiebaKeywords {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor for JiebaKeywords {
    fn keywords(&self, text: &str, top_k: usize) -> Vec<String> {
        self.tfidf
            .extract_keywords(&self.jieba, text, top_k, vec![])
            .into_iter()
            .map(|k| k.keyword)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyticsOptions {
    /// Keywords passed to the word cloud.
    pub top_k: usize,
    /// Bars in the view-count chart.
    pub top_n: usize,
    /// Characters per label line.
    pub wrap_width: usize,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            top_n: DEFAULT_TOP_N,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

/// What the driver produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnalyticsReport {
    pub keywords: Vec<String>,
    pub word_cloud_rendered: bool,
    pub bars: Vec<Bar>,
}

/// All titles joined with a single space.
pub fn joined_titles(table: &RankingTable) -> String {
    table.records().iter().map(|r| r.title.as_str()).join(" ")
}

/// Split `title` into lines of at most `width` characters.
pub fn wrap_title(title: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = title.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// The `n` most-viewed records, highest first.
///
/// The sort is stable, so equal view counts keep their rank order.
pub fn top_by_views(table: &RankingTable, n: usize) -> Vec<&RankingRecord> {
    table
        .records()
        .iter()
        .sorted_by_key(|r| Reverse(r.view_count))
        .take(n)
        .collect()
}

/// Run keyword extraction and both renderers over `table`.
///
/// `table` is expected to come from [`crate::outputs::table::read_table`],
/// which re-normalizes every count it reads.
///
/// The word cloud is skipped when there is no title text or no keyword
/// survives extraction. The bar chart is skipped for an empty table.
#[instrument(level = "info", skip_all, fields(rows = table.len()))]
pub fn run_analytics(
    table: &RankingTable,
    options: &AnalyticsOptions,
    extractor: &impl KeywordExtractor,
    word_cloud: &impl WordCloudRenderer,
    bar_chart: &impl BarChartRenderer,
) -> Result<AnalyticsReport, Box<dyn Error>> {
    let mut report = AnalyticsReport::default();

    let text = joined_titles(table);
    if text.trim().is_empty() {
        warn!("No title text; skipping word cloud");
    } else {
        report.keywords = extractor.keywords(&text, options.top_k);
        debug!(keywords = ?report.keywords, "Extracted keywords");
        if report.keywords.is_empty() {
            warn!("No keywords extracted; skipping word cloud");
        } else {
            word_cloud.render_word_cloud(&report.keywords)?;
            report.word_cloud_rendered = true;
        }
    }

    report.bars = top_by_views(table, options.top_n)
        .into_iter()
        .map(|record| Bar {
            label_lines: wrap_title(&record.title, options.wrap_width),
            value: record.view_count,
        })
        .collect();

    if report.bars.is_empty() {
        warn!("No records; skipping bar chart");
    } else {
        bar_chart.render_bar_chart(&report.bars)?;
    }

    info!(
        keywords = report.keywords.len(),
        word_cloud = report.word_cloud_rendered,
        bars = report.bars.len(),
        "Analytics complete"
    );
    Ok(report)
}
