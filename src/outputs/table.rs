//! Delimited table persistence.
//!
//! The ranking table is written as UTF-8 CSV with a byte-order mark, so
//! spreadsheet tools pick up the Chinese column names, and is overwritten on
//! every run.
//!
//! # Columns
//!
//! ```text
//! 排行,视频标题,视频地址,作者,播放数,弹幕数[,硬币数,点赞数,分享数,收藏数]
//! ```
//!
//! The bracketed columns are written only when every record came from the API.

use crate::models::{Field, RankingRecord, RankingTable, RawRecord, RawValue};
use crate::normalize::{normalize, parse_count};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Column name of the rank.
pub const RANK_COLUMN: &str = "排行";
const BOM: &str = "\u{feff}";

const BASE_FIELDS: [Field; 5] = [Field::Title, Field::Url, Field::Author, Field::View, Field::Danmaku];
const EXTENDED_FIELDS: [Field; 4] = [Field::Coin, Field::Like, Field::Share, Field::Favorite];

fn header(extended: bool) -> Vec<&'static str> {
    let mut columns = vec![RANK_COLUMN];
    columns.extend(BASE_FIELDS.iter().map(|f| f.column_name()));
    if extended {
        columns.extend(EXTENDED_FIELDS.iter().map(|f| f.column_name()));
    }
    columns
}

fn row(record: &RankingRecord, extended: bool) -> Vec<String> {
    let mut cells = vec![
        record.rank.to_string(),
        record.title.clone(),
        record.url.clone(),
        record.author.clone(),
        record.view_count.to_string(),
        record.danmaku_count.to_string(),
    ];
    if extended {
        if let Some(m) = record.extended {
            cells.extend([
                m.coin_count.to_string(),
                m.like_count.to_string(),
                m.share_count.to_string(),
                m.favorite_count.to_string(),
            ]);
        }
    }
    cells
}

/// Render the table as CSV bytes, BOM included.
pub fn to_csv_bytes(table: &RankingTable) -> Result<Vec<u8>, Box<dyn Error>> {
    let extended = table.has_extended_metrics();
    let mut buf = BOM.as_bytes().to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(header(extended))?;
        for record in table.records() {
            writer.write_record(row(record, extended))?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// Parse CSV text back into a table, re-normalizing every cell.
///
/// Cells are treated as text regardless of how they were written, so counts
/// such as `"12.3万"` in a hand-edited file still come back in raw units.
/// Columns with unknown names are ignored.
pub fn from_csv_str(text: &str) -> Result<RankingTable, Box<dyn Error>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let rank_index = headers.iter().position(|h| h == RANK_COLUMN);
    let columns: Vec<Option<Field>> = headers.iter().map(Field::from_column_name).collect();

    let mut records = Vec::new();
    for (position, result) in reader.records().enumerate() {
        let row = result?;
        let rank = rank_index
            .and_then(|i| row.get(i))
            .map(parse_count)
            .and_then(|r| u32::try_from(r).ok())
            .filter(|r| *r > 0)
            .unwrap_or(position as u32 + 1);

        let mut raw = RawRecord::new(rank);
        for (cell, column) in row.iter().zip(&columns) {
            if let Some(field) = column {
                raw.fields.insert(*field, RawValue::Text(cell.to_string()));
            }
        }
        records.push(normalize(&raw));
    }

    Ok(RankingTable::build(records))
}

/// Write the table to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_table(table: &RankingTable, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let bytes = to_csv_bytes(table)?;
    fs::write(path, bytes).await?;
    info!(
        rows = table.len(),
        extended = table.has_extended_metrics(),
        "Wrote ranking table"
    );
    Ok(())
}

/// Read a persisted table back from `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_table(path: &Path) -> Result<RankingTable, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let table = from_csv_str(&text)?;
    if table.is_empty() {
        warn!("Persisted ranking table has no rows");
    } else {
        info!(rows = table.len(), "Read ranking table");
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtendedMetrics;
    use tempfile::TempDir;

    fn api_record(rank: u32, views: u64) -> RankingRecord {
        RankingRecord {
            rank,
            title: format!("视频, \"{rank}\""),
            url: format!("https://www.bilibili.com/video/BV{rank}"),
            author: format!("up{rank}"),
            view_count: views,
            danmaku_count: 7,
            extended: Some(ExtendedMetrics {
                coin_count: 1,
                like_count: 2,
                share_count: 3,
                favorite_count: 4,
            }),
        }
    }

    fn page_record(rank: u32) -> RankingRecord {
        RankingRecord {
            extended: None,
            ..api_record(rank, 123_000)
        }
    }

    #[test]
    fn test_header_depends_on_schema() {
        let api = RankingTable::build(vec![api_record(1, 5)]);
        let text = String::from_utf8(to_csv_bytes(&api).unwrap()).unwrap();
        assert!(text.starts_with(BOM));
        let first_line = text.trim_start_matches(BOM).lines().next().unwrap();
        assert_eq!(
            first_line,
            "排行,视频标题,视频地址,作者,播放数,弹幕数,硬币数,点赞数,分享数,收藏数"
        );

        let page = RankingTable::build(vec![page_record(1)]);
        let text = String::from_utf8(to_csv_bytes(&page).unwrap()).unwrap();
        let first_line = text.trim_start_matches(BOM).lines().next().unwrap();
        assert_eq!(first_line, "排行,视频标题,视频地址,作者,播放数,弹幕数");
    }

    #[tokio::test]
    async fn test_round_trip_preserves_rank_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("TOP100.csv");
        let table = RankingTable::build((1..=20).map(|r| api_record(r, u64::from(r) * 10)).collect());

        write_table(&table, &path).await.unwrap();
        let back = read_table(&path).await.unwrap();

        assert_eq!(back.len(), 20);
        let ranks: Vec<u32> = back.records().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=20).collect::<Vec<_>>());
        assert_eq!(back, table);
    }

    #[tokio::test]
    async fn test_round_trip_page_schema_keeps_metrics_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TOP100.csv");
        let table = RankingTable::build(vec![page_record(1), page_record(2)]);

        write_table(&table, &path).await.unwrap();
        let back = read_table(&path).await.unwrap();
        assert!(back.records().iter().all(|r| r.extended.is_none()));
        assert_eq!(back.records()[0].view_count, 123_000);
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TOP100.csv");

        write_table(&RankingTable::build(vec![api_record(1, 1), api_record(2, 2)]), &path)
            .await
            .unwrap();
        write_table(&RankingTable::build(vec![page_record(1)]), &path)
            .await
            .unwrap();

        assert_eq!(read_table(&path).await.unwrap().len(), 1);
    }

    #[test]
    fn test_read_renormalizes_suffixed_text() {
        let text = "排行,视频标题,播放数,备注\n1,甲,12.3万,x\n2,乙,\"1,234\",y\n";
        let table = from_csv_str(text).unwrap();
        assert_eq!(table.records()[0].view_count, 123_000);
        assert_eq!(table.records()[1].view_count, 1_234);
        assert_eq!(table.records()[1].title, "乙");
    }

    #[test]
    fn test_read_without_rank_column_uses_position() {
        let table = from_csv_str("视频标题\n甲\n乙\n").unwrap();
        let ranks: Vec<u32> = table.records().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }
}
