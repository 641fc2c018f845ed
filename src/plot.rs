use crate::error::{PropertyError, Result};
use crate::table::read_numeric_column;
use log::{debug, info, warn};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const FONT_FAMILY: &str = "sans-serif";
const WHISKER_IQR_FACTOR: f64 = 1.5;
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

// Horizontal layout in chart coordinates: box centred on 0, points to its left.
const BOX_CENTER: f64 = 0.0;
const BOX_HALF_WIDTH: f64 = 0.25;
const X_RANGE: (f64, f64) = (-1.0, 0.6);

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED_FONT: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Rendering settings for boxplot images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    /// Jitter spread as a fraction of the box width
    pub jitter: f64,
    /// Centre of the point cloud, in box half-widths from the box centre
    pub point_position: f64,
    pub seed: u64,
    /// TrueType font for title and axis text; system locations are searched when unset
    pub font_path: Option<PathBuf>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 700,
            height: 500,
            jitter: 0.3,
            point_position: -1.8,
            seed: 0x5EED_B0C5,
            font_path: None,
        }
    }
}

impl PlotOptions {
    /// # Errors
    /// * Returns `PropertyError::InvalidParameter` for a zero-sized canvas or a
    ///   jitter outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PropertyError::invalid_parameter(
                "plot.size",
                format!("{}x{}", self.width, self.height),
                "must be non-zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(PropertyError::invalid_parameter(
                "plot.jitter",
                self.jitter,
                "must be within 0..1",
            ));
        }
        Ok(())
    }
}

/// Five-number summary plus outliers of one value series
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Computes quartiles and 1.5×IQR whiskers.
    ///
    /// Whiskers end at the most extreme data points still inside the fences, so
    /// a single value collapses the whole box onto that value.
    ///
    /// # Errors
    /// * Returns `PropertyError::EmptyData` for an empty slice
    /// * Returns `PropertyError::DataError` if a value is NaN or infinite
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(PropertyError::EmptyData("cannot summarize zero values".into()));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(PropertyError::DataError(format!("Non-finite value {}", bad)));
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);

        let iqr = q3 - q1;
        let lower_fence = q1 - WHISKER_IQR_FACTOR * iqr;
        let upper_fence = q3 + WHISKER_IQR_FACTOR * iqr;

        let (inside, outliers): (Vec<f64>, Vec<f64>) = values
            .iter()
            .partition(|v| (lower_fence..=upper_fence).contains(*v));
        let lower_whisker = inside.iter().copied().fold(q1, f64::min);
        let upper_whisker = inside.iter().copied().fold(q3, f64::max);

        Ok(Self {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Linear interpolation between the closest ranks (R type 7), so every
/// quantile stays within the data range. `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Horizontal offsets in [-0.5, 0.5), one per point; a fixed seed keeps the image reproducible
fn jitter_offsets(seed: u64, count: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(-0.5..0.5)).collect()
}

fn render_error(e: impl Display) -> PropertyError {
    PropertyError::Render(e.to_string())
}

fn locate_font(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(PropertyError::Render(format!(
            "font file {} does not exist",
            path.display()
        )));
    }

    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| {
            PropertyError::Render(
                "no TrueType font found for plot text; set plot.font_path".into(),
            )
        })
}

/// Makes a font available to the text renderer.
///
/// An explicit path must exist and replaces any font registered earlier in the
/// process; without one, an already registered font is reused before the
/// system locations are searched.
fn ensure_font(explicit: Option<&Path>) -> Result<()> {
    let mut registered = REGISTERED_FONT.lock().map_err(render_error)?;
    if explicit.is_none() {
        if let Some(path) = registered.as_ref() {
            debug!("Using already registered font {}", path.display());
            return Ok(());
        }
    }

    let path = locate_font(explicit)?;
    if registered.as_ref() == Some(&path) {
        return Ok(());
    }

    let bytes = fs::read(&path)
        .map_err(|e| PropertyError::Render(format!("cannot read font {}: {}", path.display(), e)))?;
    // ab_glyph keeps a 'static reference to the registered font data.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| PropertyError::Render(format!("invalid font {}", path.display())))?;

    if let Some(previous) = registered.as_ref() {
        warn!(
            "Replacing plot font {} with {}",
            previous.display(),
            path.display()
        );
    }
    debug!("Registered font {}", path.display());
    *registered = Some(path);
    Ok(())
}

fn check_format(out: &Path) -> Result<()> {
    let ext = out
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if SUPPORTED_FORMATS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(PropertyError::Render(format!(
            "unsupported image format '.{}' for {}",
            ext,
            out.display()
        )))
    }
}

fn y_range(stats: &BoxStats, values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(stats.lower_whisker, f64::min);
    let hi = values.iter().copied().fold(stats.upper_whisker, f64::max);
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (lo.abs() * 0.05).max(0.5)
    };
    (lo - pad, hi + pad)
}

/// Renders a single-series boxplot of in-memory values.
///
/// The box spans the quartiles with a median line and 1.5×IQR whiskers; every
/// value is drawn as a point to the left of the box with horizontal jitter.
///
/// # Arguments
/// * `values` - Series to summarize
/// * `property_name` - Used in the title (`Boxplot of <name>`) and as the y axis label
/// * `out` - Destination image; the format follows the extension (png, jpg, bmp)
/// * `options` - Canvas size, jitter and font settings
///
/// # Errors
/// * Returns `PropertyError::EmptyData` if `values` is empty
/// * Returns `PropertyError::Io` if the destination cannot be created
/// * Returns `PropertyError::Render` for an unsupported extension, a missing font,
///   or a drawing or encoding failure
pub fn render_boxplot<P: AsRef<Path>>(
    values: &[f64],
    property_name: &str,
    out: P,
    options: &PlotOptions,
) -> Result<()> {
    let out = out.as_ref();
    options.validate()?;
    let stats = BoxStats::from_values(values)?;
    check_format(out)?;
    ensure_font(options.font_path.as_deref())?;

    // Surface an unwritable destination as an IO error before the backend touches it.
    File::create(out)?;

    let color = RGBColor(0x63, 0x6E, 0xFA);
    let (y_lo, y_hi) = y_range(&stats, values);
    let box_left = BOX_CENTER - BOX_HALF_WIDTH;
    let box_right = BOX_CENTER + BOX_HALF_WIDTH;
    let cap_half = BOX_HALF_WIDTH / 2.0;

    let root = BitMapBackend::new(out, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Boxplot of {}", property_name), (FONT_FAMILY, 24))
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(80)
        .build_cartesian_2d(X_RANGE.0..X_RANGE.1, y_lo..y_hi)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_: &f64| String::new())
        .x_desc(property_name)
        .y_desc(property_name)
        .axis_desc_style((FONT_FAMILY, 16))
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(box_left, stats.q1), (box_right, stats.q3)],
            color.mix(0.3).filled(),
        )))
        .map_err(render_error)?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(box_left, stats.q1), (box_right, stats.q3)],
            color.stroke_width(2),
        )))
        .map_err(render_error)?;

    let segments = vec![
        vec![(box_left, stats.median), (box_right, stats.median)],
        vec![(BOX_CENTER, stats.q3), (BOX_CENTER, stats.upper_whisker)],
        vec![(BOX_CENTER, stats.q1), (BOX_CENTER, stats.lower_whisker)],
        vec![
            (BOX_CENTER - cap_half, stats.upper_whisker),
            (BOX_CENTER + cap_half, stats.upper_whisker),
        ],
        vec![
            (BOX_CENTER - cap_half, stats.lower_whisker),
            (BOX_CENTER + cap_half, stats.lower_whisker),
        ],
    ];
    chart
        .draw_series(
            segments
                .into_iter()
                .map(|points| PathElement::new(points, color.stroke_width(2))),
        )
        .map_err(render_error)?;

    let points_center = BOX_CENTER + options.point_position * BOX_HALF_WIDTH;
    let spread = options.jitter * 2.0 * BOX_HALF_WIDTH;
    let offsets = jitter_offsets(options.seed, values.len());
    chart
        .draw_series(values.iter().zip(offsets).map(|(&v, offset)| {
            Circle::new((points_center + offset * spread, v), 3, color.filled())
        }))
        .map_err(render_error)?;

    root.present().map_err(render_error)?;

    info!(
        "Rendered boxplot of {} values ({} outliers) to {}",
        values.len(),
        stats.outliers.len(),
        out.display()
    );
    Ok(())
}

/// Reads one numeric column from a CSV file and renders its boxplot.
///
/// # Arguments
/// * `csv_path` - Delimited file with a header row
/// * `column` - Column to plot; also used for the title and y axis label
/// * `out` - Destination image path
/// * `options` - Rendering settings
///
/// # Errors
/// * Returns `PropertyError::FileNotFound` if `csv_path` is missing
/// * Returns `PropertyError::DataError` if the column is absent or non-numeric
/// * Returns `PropertyError::EmptyData` if there are no rows
/// * Returns `PropertyError::Io` or `PropertyError::Render` as for [`render_boxplot`]
pub fn plot_boxplot<P: AsRef<Path>, Q: AsRef<Path>>(
    csv_path: P,
    column: &str,
    out: Q,
    options: &PlotOptions,
) -> Result<()> {
    let values = read_numeric_column(csv_path, column)?;
    render_boxplot(&values, column, out, options)
}
