//! Scatter chart of miss distance against velocity, rendered to PNG

use anyhow::{Context, Result};
use neo_core::{ApproachRecord, NeoError};
use resvg::tiny_skia;
use resvg::usvg::{fontdb, Options, Tree};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

const SVG_TEMPLATE: &str = include_str!("../../resources/scatter_template.svg");
const OUTPUT_FILE: &str = "neo_scatter.png";

static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

/// Value range of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    min: f64,
    max: f64,
}

impl Axis {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        let (min, max) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

        // A single value still needs a non-empty range
        if min == max {
            let pad = (min.abs() * 0.05).max(1.0);
            return Some(Self { min: min - pad, max: max + pad });
        }
        Some(Self { min, max })
    }

    /// Map `value` onto the pixel interval `[from, to]`
    fn project(&self, value: f64, from: f32, to: f32) -> f32 {
        let t = (value - self.min) / (self.max - self.min);
        from + (to - from) * t as f32
    }

    fn ticks(&self, count: usize) -> impl Iterator<Item = f64> + '_ {
        let step = (self.max - self.min) / (count - 1) as f64;
        (0..count).map(move |i| self.min + step * i as f64)
    }
}

pub struct ScatterRenderer {
    output_dir: PathBuf,
}

impl ScatterRenderer {
    // Plot area, matches the template frame
    const PLOT_LEFT: f32 = 90.0;
    const PLOT_RIGHT: f32 = 870.0;
    const PLOT_TOP: f32 = 60.0;
    const PLOT_BOTTOM: f32 = 520.0;

    const TICK_COUNT: usize = 5;
    const POINT_RADIUS: f32 = 4.0;

    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Latest chart written by [`render`](Self::render)
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILE)
    }

    /// Render the chart and return the PNG bytes. Records missing either
    /// coordinate are left out.
    ///
    /// The bytes are also saved as the latest chart in the output directory.
    /// Concurrent renders each answer with their own bytes.
    pub async fn render(&self, records: &[ApproachRecord]) -> Result<Vec<u8>, NeoError> {
        let svg = Self::build_svg(records)?;

        let png = render_svg_to_png(&svg).map_err(|e| NeoError::Render(format!("{:#}", e)))?;
        self.save_latest(&png)
            .await
            .map_err(|e| NeoError::Render(format!("{:#}", e)))?;

        tracing::info!("Generated NEO scatter chart: {:?}", self.output_path());
        Ok(png)
    }

    async fn save_latest(&self, png: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .context("Failed to create output directory")?;

        // Readers of the output path never see a half-written file
        let staging = self
            .output_dir
            .join(format!("{}.{}.tmp", OUTPUT_FILE, Uuid::now_v7()));
        tokio::fs::write(&staging, png)
            .await
            .with_context(|| format!("Failed to write {:?}", staging))?;
        if let Err(e) = tokio::fs::rename(&staging, self.output_path()).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e).context("Failed to replace latest chart");
        }
        Ok(())
    }

    pub fn build_svg(records: &[ApproachRecord]) -> Result<String, NeoError> {
        let points: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| Some((r.velocity_kph?, r.miss_distance_km?)))
            .collect();

        let (Some(x_axis), Some(y_axis)) = (
            Axis::from_values(points.iter().map(|p| p.0)),
            Axis::from_values(points.iter().map(|p| p.1)),
        ) else {
            return Err(NeoError::EmptyResult {
                field: "velocity_kph and miss_distance_km",
            });
        };

        let footer = format!(
            "{} of {} records plotted, generated {}",
            points.len(),
            records.len(),
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        );

        Ok(SVG_TEMPLATE
            .replace("{{GRID}}", &Self::build_grid_svg(&x_axis, &y_axis))
            .replace("{{POINTS}}", &Self::build_points_svg(&points, &x_axis, &y_axis))
            .replace("{{FOOTER}}", &escape_xml(&footer)))
    }

    fn build_grid_svg(x_axis: &Axis, y_axis: &Axis) -> String {
        let mut svg = String::new();

        for value in x_axis.ticks(Self::TICK_COUNT) {
            let x = x_axis.project(value, Self::PLOT_LEFT, Self::PLOT_RIGHT);
            let _ = write!(
                svg,
                r##"<line x1="{x:.1}" y1="{top}" x2="{x:.1}" y2="{bottom}" stroke="#dddddd" stroke-width="1"/><text x="{x:.1}" y="{label_y}" font-family="sans-serif" font-size="11" fill="#555555" text-anchor="middle">{label}</text>"##,
                top = Self::PLOT_TOP,
                bottom = Self::PLOT_BOTTOM,
                label_y = Self::PLOT_BOTTOM + 18.0,
                label = format_tick(value),
            );
        }

        for value in y_axis.ticks(Self::TICK_COUNT) {
            // SVG y grows downwards
            let y = y_axis.project(value, Self::PLOT_BOTTOM, Self::PLOT_TOP);
            let _ = write!(
                svg,
                r##"<line x1="{left}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#dddddd" stroke-width="1"/><text x="{label_x}" y="{text_y:.1}" font-family="sans-serif" font-size="11" fill="#555555" text-anchor="end">{label}</text>"##,
                left = Self::PLOT_LEFT,
                right = Self::PLOT_RIGHT,
                label_x = Self::PLOT_LEFT - 6.0,
                text_y = y + 4.0,
                label = format_tick(value),
            );
        }

        svg
    }

    fn build_points_svg(points: &[(f64, f64)], x_axis: &Axis, y_axis: &Axis) -> String {
        let mut svg = String::new();
        for &(velocity, distance) in points {
            let cx = x_axis.project(velocity, Self::PLOT_LEFT, Self::PLOT_RIGHT);
            let cy = y_axis.project(distance, Self::PLOT_BOTTOM, Self::PLOT_TOP);
            let _ = write!(
                svg,
                r##"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r}" fill="#1f77b4" fill-opacity="0.75"/>"##,
                r = Self::POINT_RADIUS,
            );
        }
        svg
    }
}

/// Compact tick label: 12000000 -> "12.0M"
fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}G", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn system_fonts() -> Arc<fontdb::Database> {
    FONTS
        .get_or_init(|| {
            let mut fontdb = fontdb::Database::new();
            fontdb.load_system_fonts();
            tracing::debug!("Loaded {} font faces", fontdb.len());
            Arc::new(fontdb)
        })
        .clone()
}

fn render_svg_to_png(svg_content: &str) -> Result<Vec<u8>> {
    let mut options = Options::default();
    options.fontdb = system_fonts();

    let tree = Tree::from_str(svg_content, &options).context("Failed to parse SVG")?;

    let size = tree.size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width() as u32, size.height() as u32)
        .context("Failed to create pixmap")?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().context("Failed to encode PNG")
}
