//! # bili_rank
//!
//! Fetches the bilibili video ranking, normalizes it into one table, persists
//! it as CSV and renders two views of it: a keyword word cloud of the titles
//! and a bar chart of the most-viewed entries.
//!
//! ## Usage
//!
//! ```sh
//! bili_rank                      # structured API
//! bili_rank --source page        # rendered ranking page via headless Chrome
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: One request through the chosen transport, retried on failure
//! 2. **Extraction**: Raw field mappings pulled out of the JSON or HTML payload
//! 3. **Normalization**: Counts such as `"12.3万"` converted to raw integers
//! 4. **Output**: The table written to CSV, read back and charted

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod analytics;
mod cli;
mod config;
mod extractors;
mod fetch;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod transports;
mod utils;

use analytics::{run_analytics, JiebaKeywords};
use cli::Cli;
use config::load_config;
use outputs::charts::{SvgBarChart, SvgWordCloud};
use outputs::table;
use utils::ensure_writable_parent;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("bili_rank starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = load_config(args.config.as_deref()).await?;
    debug!(?config, "Effective configuration");

    // Early check: the table has somewhere to go
    if let Err(e) = ensure_writable_parent(&args.output).await {
        error!(
            path = %args.output.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Fetch, extract, normalize ----
    info!(source = ?args.source, "Fetching ranking");
    let Some(ranking) = pipeline::fetch_table(args.source, &config, args.chrome_path.clone()).await?
    else {
        error!("No ranking data; nothing written");
        return Ok(());
    };

    if ranking.is_empty() {
        warn!(source = ?args.source, hint = args.source.empty_hint(), "Ranking came back empty");
    }

    // ---- Persist ----
    table::write_table(&ranking, &args.output).await?;

    // ---- Analytics on the persisted table ----
    if args.no_charts {
        info!("Chart rendering disabled");
    } else {
        let persisted = table::read_table(&args.output).await?;
        let report = run_analytics(
            &persisted,
            &config.analytics(),
            &JiebaKeywords::new(),
            &SvgWordCloud::new(&args.chart_dir),
            &SvgBarChart::new(&args.chart_dir),
        )?;
        info!(
            chart_dir = %args.chart_dir.display(),
            keywords = report.keywords.len(),
            word_cloud = report.word_cloud_rendered,
            bars = report.bars.len(),
            "Rendered analytic views"
        );
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
