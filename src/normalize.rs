//! Field normalization.
//!
//! Reconciles the two numeric representations the sources produce: plain
//! integers from the API and localized text such as `"12.3万"` or `"1,234"`
//! from the rendered page. Normalization never fails; anything unparsable
//! becomes `0`.

use crate::models::{
    ExtendedMetrics, Field, RankingRecord, RawRecord, RawValue, UNKNOWN_AUTHOR, UNKNOWN_TITLE,
    UNKNOWN_URL,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Magnitude marker for ten-thousand.
const WAN: char = '万';
/// Number of decimal places `万` shifts by.
const WAN_DIGITS: usize = 4;

static NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]").unwrap());

/// Parse a displayed counter into raw units.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_count("12.3万"), 123_000);
/// assert_eq!(parse_count("1,234"), 1_234);
/// assert_eq!(parse_count("n/a"), 0);
/// ```
pub fn parse_count(text: &str) -> u64 {
    let cleaned = NOISE.replace_all(text, "");

    let parsed = if cleaned.contains(WAN) {
        scale_decimal(&cleaned.replace(WAN, ""), WAN_DIGITS)
    } else {
        cleaned.parse::<u64>().ok()
    };

    if parsed.is_none() && !cleaned.is_empty() {
        trace!(text, "Unparsable count; using 0");
    }
    parsed.unwrap_or(0)
}

/// Multiply a non-negative decimal by `10^shift`, flooring the result.
///
/// Done on the digits rather than through `f64` so `"4.56"` shifted by four
/// is exactly `45600`.
fn scale_decimal(text: &str, shift: usize) -> Option<u64> {
    let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let kept: String = frac.chars().take(shift).collect();
    let padded = format!("{whole}{kept:0<shift$}");
    padded.parse::<u64>().ok()
}

/// Normalize a single numeric value from either source.
pub fn count_value(value: &RawValue) -> u64 {
    match value {
        RawValue::Int(n) => u64::try_from(*n).unwrap_or(0),
        RawValue::Text(s) => parse_count(s),
    }
}

fn text_or(raw: &RawRecord, field: Field, sentinel: &str) -> String {
    match raw.get(field) {
        Some(value) => value.to_string(),
        None => sentinel.to_string(),
    }
}

fn count_of(raw: &RawRecord, field: Field) -> Option<u64> {
    raw.get(field).map(count_value)
}

/// Convert a raw field mapping into a canonical [`RankingRecord`].
///
/// The API-only counters are kept only when all four are present; a
/// rendered-page record never gets zero-filled counters it did not have.
pub fn normalize(raw: &RawRecord) -> RankingRecord {
    let extended = match (
        count_of(raw, Field::Coin),
        count_of(raw, Field::Like),
        count_of(raw, Field::Share),
        count_of(raw, Field::Favorite),
    ) {
        (Some(coin_count), Some(like_count), Some(share_count), Some(favorite_count)) => {
            Some(ExtendedMetrics {
                coin_count,
                like_count,
                share_count,
                favorite_count,
            })
        }
        _ => None,
    };

    RankingRecord {
        rank: raw.rank,
        title: text_or(raw, Field::Title, UNKNOWN_TITLE),
        url: text_or(raw, Field::Url, UNKNOWN_URL),
        author: text_or(raw, Field::Author, UNKNOWN_AUTHOR),
        view_count: count_of(raw, Field::View).unwrap_or(0),
        danmaku_count: count_of(raw, Field::Danmaku).unwrap_or(0),
        extended,
    }
}
