//! Extractor for the structured ranking endpoint.
//!
//! The response is expected to look like:
//!
//! ```text
//! { "data": { "list": [ { "title", "bvid", "owner": { "name" },
//!                         "stat": { "view", "danmaku", "coin", "like", "share", "favorite" } } ] } }
//! ```
//!
//! Any missing key fails the whole payload; there is no partial list.

use super::{ExtractError, Extractor};
use crate::models::{Field, RawPayload, RawRecord};
use serde::Deserialize;
use tracing::{info, instrument};

/// Prefix of a video page; the `bvid` is appended.
pub const VIDEO_URL_PREFIX: &str = "https://www.bilibili.com/video/";

#[derive(Debug, Deserialize)]
struct RankingResponse {
    data: RankingData,
}

#[derive(Debug, Deserialize)]
struct RankingData {
    list: Vec<RankingEntry>,
}

#[derive(Debug, Deserialize)]
struct RankingEntry {
    title: String,
    bvid: String,
    owner: Owner,
    stat: Stat,
}

#[derive(Debug, Deserialize)]
struct Owner {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Stat {
    view: i64,
    danmaku: i64,
    coin: i64,
    like: i64,
    share: i64,
    favorite: i64,
}

impl RankingEntry {
    fn into_raw(self, rank: u32) -> RawRecord {
        RawRecord::new(rank)
            .with(Field::Title, self.title)
            .with(Field::Url, format!("{VIDEO_URL_PREFIX}{}", self.bvid))
            .with(Field::Author, self.owner.name)
            .with(Field::View, self.stat.view)
            .with(Field::Danmaku, self.stat.danmaku)
            .with(Field::Coin, self.stat.coin)
            .with(Field::Like, self.stat.like)
            .with(Field::Share, self.stat.share)
            .with(Field::Favorite, self.stat.favorite)
    }
}

/// Walks `data.list[]` of the ranking API response.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiExtractor;

impl Extractor for ApiExtractor {
    #[instrument(level = "info", skip_all)]
    fn extract(&self, payload: &RawPayload) -> Result<Vec<RawRecord>, ExtractError> {
        let RawPayload::Json(value) = payload else {
            return Err(ExtractError::UnexpectedPayload {
                expected: "json",
                actual: payload.kind(),
            });
        };

        let response = RankingResponse::deserialize(value)?;
        let records: Vec<RawRecord> = response
            .data
            .list
            .into_iter()
            .zip(1u32..)
            .map(|(entry, rank)| entry.into_raw(rank))
            .collect();

        info!(count = records.len(), "Extracted ranking API entries");
        Ok(records)
    }
}
