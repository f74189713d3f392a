//! Pitch test chart: horizontal bands of vertical lines at stepped LPI.
//!
//! A lens sheet laid over the chart shows the band whose line spacing best
//! matches the true pitch as a flat, moiré-free field. Line positions are
//! rounded independently in every band, so at high strip counts spacing can
//! look slightly uneven from band to band.

use crate::error::Result;
use crate::raster::{BLACK, Raster, WHITE};
use crate::settings::{CalibrationSettings, JobSettings};
use crate::text::{self, LabelStyle};

const LABEL: LabelStyle = LabelStyle {
    scale: 2,
    padding: 4,
    ink: BLACK,
    background: WHITE,
};
const SMALL_LABEL: LabelStyle = LabelStyle {
    scale: 1,
    padding: 2,
    ink: BLACK,
    background: WHITE,
};
/// Distance of labels and caption from the chart edges.
const INSET: i64 = 8;

/// One horizontal band of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationBand {
    pub index: u32,
    pub lpi: f64,
    /// First pixel row of the band.
    pub y_start: u32,
    /// One past the last pixel row.
    pub y_end: u32,
    /// Columns holding a line.
    pub line_columns: Vec<u32>,
}

/// What [`render_calibration_chart`] drew.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationChart {
    pub bands: Vec<CalibrationBand>,
    /// Exact (fractional) band height, `height / strip_count`.
    pub band_height: f64,
    pub caption: String,
}

/// Format an LPI value with up to three decimals, trailing zeros removed.
pub fn format_lpi(lpi: f64) -> String {
    let s = format!("{lpi:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

/// Column positions of lines spaced `spacing` pixels apart across `width`.
fn line_columns(width: u32, spacing: f64) -> Vec<u32> {
    let mut cols = Vec::new();
    let mut k = 0u32;
    loop {
        let x = k as f64 * spacing;
        if x >= width as f64 {
            break;
        }
        let col = x.round() as u32;
        if col < width && cols.last() != Some(&col) {
            cols.push(col);
        }
        k += 1;
    }
    cols
}

/// Render the test chart for the job's physical size and resolution.
///
/// The surface is resized to the content size; margins are not used.
pub fn render_calibration_chart(
    surface: &mut Raster,
    job: &JobSettings,
    calibration: &CalibrationSettings,
) -> Result<CalibrationChart> {
    job.validate()?;
    calibration.validate()?;
    let layout = job.layout();
    let (width, height) = (layout.content_width, layout.content_height);

    surface.resize(width, height)?;
    surface.fill(WHITE);

    let n = calibration.strip_count;
    let band_height = height as f64 / n as f64;
    let mut bands = Vec::with_capacity(n as usize);

    for index in 0..n {
        let lpi = calibration.lpi_for_strip(index);
        let y_start = (index as f64 * band_height).round() as u32;
        let y_end = ((index + 1) as f64 * band_height).round() as u32;
        let rows = (y_end - y_start) as i64;

        let columns = line_columns(width, job.ppi_x / lpi);
        for &col in &columns {
            surface.fill_rect(col as i64, y_start as i64, 1, rows, BLACK);
        }

        let label = format!("{} LPI", format_lpi(lpi));
        // Bands too short for the small label stay unlabelled.
        let style = [LABEL, SMALL_LABEL]
            .into_iter()
            .find(|style| style.patch_size(&label).1 as i64 <= rows);
        if let Some(style) = style {
            let patch_h = style.patch_size(&label).1 as i64;
            let label_y = y_start as i64 + (rows - patch_h) / 2;
            text::draw_label(surface, INSET, label_y, &label, &style);
        }

        bands.push(CalibrationBand {
            index,
            lpi,
            y_start,
            y_end,
            line_columns: columns,
        });
    }

    let first = calibration.lpi_for_strip(0);
    let last = calibration.lpi_for_strip(n - 1);
    let caption = format!(
        "PPI {} | LPI {} - {}",
        format_lpi(job.ppi_x),
        format_lpi(first),
        format_lpi(last)
    );
    let (cw, ch) = LABEL.patch_size(&caption);
    text::draw_label(
        surface,
        width as i64 - cw as i64 - INSET,
        height as i64 - ch as i64 - INSET,
        &caption,
        &LABEL,
    );

    tracing::info!(
        width,
        height,
        strips = n,
        from_lpi = first,
        to_lpi = last,
        "calibration chart ready"
    );

    Ok(CalibrationChart {
        bands,
        band_height,
        caption,
    })
}
