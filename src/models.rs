//! Data models for ranking entries and their normalized representation.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RawPayload`]: What a transport hands back (decoded JSON or rendered HTML)
//! - [`RawRecord`]: One loosely-typed field mapping emitted by an extractor
//! - [`RankingRecord`]: The canonical, normalized ranking entry
//! - [`RankingTable`]: The rank-ordered collection built once per run

use std::collections::BTreeMap;
use std::fmt;

/// Placeholder substituted when a title cannot be extracted.
pub const UNKNOWN_TITLE: &str = "未知标题";
/// Placeholder substituted when a link cannot be extracted.
pub const UNKNOWN_URL: &str = "未知链接";
/// Placeholder substituted when an author cannot be extracted.
pub const UNKNOWN_AUTHOR: &str = "未知作者";

/// A raw response body as returned by a transport.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Decoded body of the structured ranking endpoint.
    Json(serde_json::Value),
    /// Rendered document of the ranking page.
    Html(String),
}

impl RawPayload {
    /// Short name of the payload kind, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            RawPayload::Json(_) => "json",
            RawPayload::Html(_) => "html",
        }
    }
}

/// Keys of a [`RawRecord`].
///
/// The order of the variants is the column order of the persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Url,
    Author,
    View,
    Danmaku,
    Coin,
    Like,
    Share,
    Favorite,
}

impl Field {
    /// Localized column name used in the persisted table header.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::Title => "视频标题",
            Field::Url => "视频地址",
            Field::Author => "作者",
            Field::View => "播放数",
            Field::Danmaku => "弹幕数",
            Field::Coin => "硬币数",
            Field::Like => "点赞数",
            Field::Share => "分享数",
            Field::Favorite => "收藏数",
        }
    }

    /// Reverse of [`Field::column_name`].
    pub fn from_column_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column_name() == name)
    }

    pub const ALL: [Field; 9] = [
        Field::Title,
        Field::Url,
        Field::Author,
        Field::View,
        Field::Danmaku,
        Field::Coin,
        Field::Like,
        Field::Share,
        Field::Favorite,
    ];
}

/// A loosely-typed field value: the API hands out integers, the rendered page hands out text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Int(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Int(n)
    }
}

/// One ranking entry as emitted by an extractor, before normalization.
///
/// A [`Field`] missing from `fields` is absent from the source's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based position in the emitted sequence.
    pub rank: u32,
    pub fields: BTreeMap<Field, RawValue>,
}

impl RawRecord {
    pub fn new(rank: u32) -> Self {
        Self {
            rank,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, field: Field, value: impl Into<RawValue>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn get(&self, field: Field) -> Option<&RawValue> {
        self.fields.get(&field)
    }
}

/// Engagement counters only the structured API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedMetrics {
    pub coin_count: u64,
    pub like_count: u64,
    pub share_count: u64,
    pub favorite_count: u64,
}

/// A normalized ranking entry.
///
/// `extended` is `None` for records from the rendered page: those counters are
/// unknown there, which is not the same as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRecord {
    pub rank: u32,
    pub title: String,
    pub url: String,
    pub author: String,
    pub view_count: u64,
    pub danmaku_count: u64,
    pub extended: Option<ExtendedMetrics>,
}

/// The rank-ordered table built once per run.
///
/// There is no mutating API; a table is handed to persistence as built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingTable {
    records: Vec<RankingRecord>,
}

impl RankingTable {
    /// Assemble a table from already-normalized records.
    ///
    /// Input order is preserved and ranks are taken as assigned upstream.
    pub fn build(records: Vec<RankingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RankingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when every record carries the API-only counters.
    pub fn has_extended_metrics(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.extended.is_some())
    }
}
