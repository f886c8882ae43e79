//! SVG renderers for the two analytic views.
//!
//! - [`SvgWordCloud`]: keywords laid out in rows, larger type for higher-ranked words
//! - [`SvgBarChart`]: horizontal bars of the most-viewed entries
//!
//! Both write into a chart directory that is created on demand.

use crate::analytics::{Bar, BarChartRenderer, WordCloudRenderer};
use chrono::Local;
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const WORD_CLOUD_FILE: &str = "wordcloud.svg";
pub const BAR_CHART_FILE: &str = "top10.svg";

const FONT: &str = "sans-serif";
const CLOUD_SIZE: (u32, u32) = (800, 400);
const CLOUD_MAX_FONT: f64 = 64.0;
const CLOUD_MIN_FONT: f64 = 12.0;
const CHART_SIZE: (u32, u32) = (1200, 800);
const LABEL_FONT: i32 = 14;

const PALETTE: [RGBColor; 6] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
];

fn ensure_dir(dir: &Path) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Rough rendered width of `word` at `size` px: full width for CJK, about half for ASCII.
fn text_width(word: &str, size: f64) -> f64 {
    word.chars()
        .map(|c| if c.is_ascii() { size * 0.6 } else { size })
        .sum()
}

/// Font size for the keyword at `index` of `count`, largest first.
fn font_size(index: usize, count: usize) -> f64 {
    if count <= 1 {
        return CLOUD_MAX_FONT;
    }
    let t = index as f64 / (count - 1) as f64;
    CLOUD_MAX_FONT - t * (CLOUD_MAX_FONT - CLOUD_MIN_FONT)
}

/// Word cloud written as `wordcloud.svg`.
#[derive(Debug, Clone)]
pub struct SvgWordCloud {
    dir: PathBuf,
}

impl SvgWordCloud {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(WORD_CLOUD_FILE)
    }
}

impl WordCloudRenderer for SvgWordCloud {
    #[instrument(level = "info", skip_all, fields(words = keywords.len()))]
    fn render_word_cloud(&self, keywords: &[String]) -> Result<(), Box<dyn Error>> {
        ensure_dir(&self.dir)?;
        let path = self.path();
        let root = SVGBackend::new(&path, CLOUD_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let (width, height) = (f64::from(CLOUD_SIZE.0), f64::from(CLOUD_SIZE.1));
        let gap = 8.0;
        let (mut x, mut y, mut row_height) = (gap, gap, 0.0f64);

        for (i, word) in keywords.iter().enumerate() {
            let size = font_size(i, keywords.len());
            let w = text_width(word, size);
            if x + w > width - gap && x > gap {
                x = gap;
                y += row_height + gap;
                row_height = 0.0;
            }
            if y + size > height {
                break;
            }

            let color = PALETTE[i % PALETTE.len()];
            let style = (FONT, size).into_font().color(&color);
            root.draw(&Text::new(word.as_str(), (x as i32, y as i32), style))?;

            x += w + gap;
            row_height = row_height.max(size);
        }

        root.present()?;
        info!(path = %path.display(), "Rendered word cloud");
        Ok(())
    }
}

/// Horizontal bar chart written as `top10.svg`.
#[derive(Debug, Clone)]
pub struct SvgBarChart {
    dir: PathBuf,
}

impl SvgBarChart {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(BAR_CHART_FILE)
    }
}

impl BarChartRenderer for SvgBarChart {
    #[instrument(level = "info", skip_all, fields(bars = bars.len()))]
    fn render_bar_chart(&self, bars: &[Bar]) -> Result<(), Box<dyn Error>> {
        ensure_dir(&self.dir)?;
        let path = self.path();
        let root = SVGBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let n = bars.len() as i32;
        // f64 axis: integer ranges overflow near u64::MAX when headroom and ticks are added
        let max = bars.iter().map(|b| b.value).max().unwrap_or(0).max(1) as f64;
        let caption = format!("播放量 TOP{} ({})", bars.len(), Local::now().date_naive());

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, (FONT, 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..max * 1.1, 0i32..n.max(1))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(bars.len().max(1))
            .y_label_formatter(&|y| format!("#{}", n - y))
            .x_label_formatter(&|x| format!("{x:.0}"))
            .x_desc("播放数")
            .draw()?;

        // first bar at the top
        let band = |i: usize| n - 1 - i as i32;

        chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let y = band(i);
            let mut rect = Rectangle::new([(0.0, y), (bar.value as f64, y + 1)], PALETTE[0].mix(0.6).filled());
            rect.set_margin(4, 4, 0, 0);
            rect
        }))?;

        chart.draw_series(bars.iter().enumerate().flat_map(|(i, bar)| {
            let y = band(i);
            bar.label_lines.iter().enumerate().map(move |(line, text)| {
                EmptyElement::at((0.0, y + 1))
                    + Text::new(
                        text.clone(),
                        (6, 8 + line as i32 * (LABEL_FONT + 2)),
                        (FONT, LABEL_FONT).into_font(),
                    )
            })
        }))?;

        chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            EmptyElement::at((bar.value as f64, band(i) + 1))
                + Text::new(bar.value.to_string(), (6, 8), (FONT, LABEL_FONT).into_font())
        }))?;

        root.present()?;
        info!(path = %path.display(), "Rendered bar chart");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_font_size_decreases() {
        assert_eq!(font_size(0, 1), CLOUD_MAX_FONT);
        assert_eq!(font_size(0, 10), CLOUD_MAX_FONT);
        assert_eq!(font_size(9, 10), CLOUD_MIN_FONT);
        assert!(font_size(3, 10) > font_size(4, 10));
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("中文", 10.0), 20.0);
        assert_eq!(text_width("ab", 10.0), 12.0);
    }

    #[test]
    fn test_word_cloud_writes_svg() {
        let dir = TempDir::new().unwrap();
        let renderer = SvgWordCloud::new(dir.path().join("charts"));
        let words: Vec<String> = ["原神", "游戏", "音乐", "vlog"].iter().map(|s| s.to_string()).collect();

        renderer.render_word_cloud(&words).unwrap();

        let svg = std::fs::read_to_string(renderer.path()).unwrap();
        assert!(svg.contains("原神"));
        assert!(svg.contains("vlog"));
    }

    #[test]
    fn test_bar_chart_writes_svg() {
        let dir = TempDir::new().unwrap();
        let renderer = SvgBarChart::new(dir.path());
        let bars = vec![
            Bar {
                label_lines: vec!["第一个视频".to_string()],
                value: 300,
            },
            Bar {
                label_lines: vec!["第二个".to_string(), "视频".to_string()],
                value: 100,
            },
        ];

        renderer.render_bar_chart(&bars).unwrap();

        let svg = std::fs::read_to_string(renderer.path()).unwrap();
        assert!(svg.contains("第一个视频"));
        assert!(svg.contains("300"));
    }

    #[test]
    fn test_bar_chart_handles_largest_count() {
        let dir = TempDir::new().unwrap();
        let renderer = SvgBarChart::new(dir.path());
        let bars = vec![
            Bar {
                label_lines: vec!["刷量".to_string()],
                value: crate::normalize::parse_count("18446744073709551615"),
            },
            Bar {
                label_lines: vec!["正常".to_string()],
                value: 1,
            },
        ];

        renderer.render_bar_chart(&bars).unwrap();

        let svg = std::fs::read_to_string(renderer.path()).unwrap();
        assert!(svg.contains("18446744073709551615"));
    }
}
