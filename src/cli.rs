//! Command-line interface definitions for bili_rank.
//!
//! Run settings that rarely change (endpoints, retry budget, chart sizes) live
//! in the optional YAML config; the flags here pick the source and the outputs.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Where the ranking is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// The structured ranking API (all counters).
    Api,
    /// The rendered ranking page via headless browser (views and danmaku only).
    Page,
}

impl Source {
    /// Likely cause when this source yields no entries.
    pub fn empty_hint(self) -> &'static str {
        match self {
            Source::Api => "the API response listed no entries",
            Source::Page => "the ranking page markup may have changed",
        }
    }
}

/// Command-line arguments for bili_rank.
///
/// # Examples
///
/// ```sh
/// # API source, default outputs
/// bili_rank
///
/// # Rendered page, custom output and config
/// bili_rank --source page -o out/TOP100.csv -c bili_rank.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Ranking source
    #[arg(short, long, value_enum, default_value_t = Source::Api)]
    pub source: Source,

    /// Path of the persisted ranking table
    #[arg(short, long, default_value = "TOP100.csv")]
    pub output: PathBuf,

    /// Directory for the rendered charts
    #[arg(long, default_value = "charts")]
    pub chart_dir: PathBuf,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip the word cloud and bar chart
    #[arg(long)]
    pub no_charts: bool,

    /// Chrome/Chromium executable for the page source
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<String>,
}
