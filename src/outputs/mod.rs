//! Output generation for the ranking table and the analytic views.
//!
//! # Submodules
//!
//! - [`table`]: Writes the ranking table as CSV and reads it back
//! - [`charts`]: Renders the word cloud and the top-N bar chart as SVG
//!
//! # Output Structure
//!
//! ```text
//! TOP100.csv           # ranking table, overwritten every run
//! charts/
//! ├── wordcloud.svg
//! └── top10.svg
//! ```

pub mod charts;
pub mod table;
