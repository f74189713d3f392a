//! Print-ready interlacing and the lens pitch calibration chart.
//!
//! Under every lens ridge the content width `p = ppi_x / lpi` is split into
//! one strip per frame, `p / frame_count` pixels wide. Strip widths stay
//! fractional; a pixel column belongs to the strip containing its centre, so
//! strips tile the content with no gap and no overlap.
//!
//! ```text
//!   lens 0                    lens 1
//!   |  f0  |  f1  |  f2  |    |  f0  |  f1  |  f2  |  ...
//!   x = margin_left + lens·p + frame·(p / n)
//! ```
//!
//! Each strip is filled by drawing the whole frame, scaled to the content
//! box and shifted by the frame's registration offset, clipped to that strip.

pub mod calibration;
pub mod marks;

use glam::IVec2;

use crate::config::MarkStyle;
use crate::error::{LenticuleError, Result};
use crate::raster::{Raster, Rect, WHITE};
use crate::settings::{Direction, Frame, JobSettings, PrintLayout};

pub use calibration::{CalibrationBand, CalibrationChart, render_calibration_chart};

/// Geometry actually used by one [`interlace`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterlaceReport {
    pub layout: PrintLayout,
    pub lens_count: u32,
    /// Width of one frame's strip under a lens, in output pixels.
    pub strip_width: f64,
    pub frame_count: usize,
}

/// Decoded rasters of `frames` with their registration offsets, in the
/// order they are laid out under a lens.
///
/// Fails on the first frame without a usable raster rather than skipping it.
pub fn resolve_frames<'a>(
    frames: &[Frame<'a>],
    direction: Direction,
) -> Result<Vec<(&'a Raster, IVec2)>> {
    if frames.is_empty() {
        return Err(LenticuleError::NoFrames);
    }
    let mut resolved = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        match frame.raster {
            Some(raster) if !raster.is_empty() => resolved.push((raster, frame.offset)),
            _ => {
                return Err(LenticuleError::MissingFrame {
                    index,
                    id: frame.id.clone(),
                });
            }
        }
    }
    if direction == Direction::RightToLeft {
        resolved.reverse();
    }
    Ok(resolved)
}

/// Render the interlaced print image into `surface`, resizing it to the
/// content plus margins.
pub fn interlace(
    surface: &mut Raster,
    frames: &[Frame<'_>],
    job: &JobSettings,
    marks: &MarkStyle,
) -> Result<InterlaceReport> {
    job.validate()?;
    let ordered = resolve_frames(frames, job.direction)?;
    let layout = job.layout();

    let (canvas_width, canvas_height) = layout.canvas_size()?;
    surface.resize(canvas_width, canvas_height)?;
    surface.fill(WHITE);

    let p = layout.pixels_per_pitch;
    let strip_width = p / ordered.len() as f64;
    let lens_count = layout.lens_count();
    let left = layout.margin_left as f64;
    let top = layout.margin_top as f64;
    let (cw, ch) = (layout.content_width as f64, layout.content_height as f64);
    let content = Rect::new(left, top, cw, ch);

    tracing::debug!(
        canvas_width,
        canvas_height,
        pixels_per_pitch = p,
        strip_width,
        lens_count,
        frames = ordered.len(),
        "interlacing"
    );

    let placed: Vec<(&Raster, Rect)> = ordered
        .iter()
        .map(|&(raster, offset)| {
            let dest = Rect::new(left + offset.x as f64, top + offset.y as f64, cw, ch);
            (raster, dest)
        })
        .collect();

    for lens in 0..lens_count {
        let lens_x = left + lens as f64 * p;
        for (index, (raster, dest)) in placed.iter().enumerate() {
            let strip = Rect::new(lens_x + index as f64 * strip_width, top, strip_width, ch);
            surface.draw_scaled_clipped(raster, *dest, strip.intersect(&content));
        }
    }

    if layout.has_margins() {
        marks::draw_alignment_marks(surface, &layout, job.alignment, marks);
        marks::draw_crop_marks(surface, &layout, marks);
    }

    tracing::info!(
        width = surface.width(),
        height = surface.height(),
        "interlaced print image ready"
    );

    Ok(InterlaceReport {
        layout,
        lens_count,
        strip_width,
        frame_count: ordered.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Rgba;

    const RED: Rgba = [255, 0, 0, 255];
    const BLUE: Rgba = [0, 0, 255, 255];

    fn job_one_inch() -> JobSettings {
        JobSettings {
            width_mm: 25.4,
            height_mm: 2.54,
            ppi_x: 600.0,
            ppi_y: 100.0,
            lpi: 60.0,
            ..JobSettings::default()
        }
    }

    #[test]
    fn test_two_frames_split_each_lens_in_half() {
        let a = Raster::filled(4, 4, RED);
        let b = Raster::filled(4, 4, BLUE);
        let frames = [Frame::new("a", &a), Frame::new("b", &b)];
        let mut out = Raster::default();
        let report = interlace(&mut out, &frames, &job_one_inch(), &MarkStyle::default()).unwrap();

        assert!((report.strip_width - 5.0).abs() < 1e-12);
        assert_eq!(report.lens_count, 60);
        assert_eq!((out.width(), out.height()), (600, 10));
        assert_eq!(out.get(2, 0), Some(RED));
        assert_eq!(out.get(7, 0), Some(BLUE));
        assert_eq!(out.get(12, 9), Some(RED));
        assert_eq!(out.get(599, 5), Some(BLUE));
    }

    #[test]
    fn test_fractional_strips_cover_every_column() {
        let a = Raster::filled(2, 2, RED);
        let b = Raster::filled(2, 2, BLUE);
        let c = Raster::filled(2, 2, [0, 255, 0, 255]);
        let frames = [Frame::new("a", &a), Frame::new("b", &b), Frame::new("c", &c)];
        let job = JobSettings {
            lpi: 70.0,
            ..job_one_inch()
        };
        let mut out = Raster::default();
        interlace(&mut out, &frames, &job, &MarkStyle::default()).unwrap();
        assert!(out.pixels().iter().all(|p| *p != WHITE));
    }

    #[test]
    fn test_missing_raster_fails_fast() {
        let a = Raster::filled(2, 2, RED);
        let frames = [
            Frame::new("a", &a),
            Frame {
                id: "b".into(),
                raster: None,
                offset: glam::IVec2::ZERO,
            },
        ];
        let mut out = Raster::default();
        let err = interlace(&mut out, &frames, &job_one_inch(), &MarkStyle::default()).unwrap_err();
        assert!(matches!(err, LenticuleError::MissingFrame { index: 1, .. }));
    }

    #[test]
    fn test_no_frames_is_an_error() {
        let mut out = Raster::default();
        let err = interlace(&mut out, &[], &job_one_inch(), &MarkStyle::default()).unwrap_err();
        assert!(matches!(err, LenticuleError::NoFrames));
    }

    #[test]
    fn test_offset_shifts_frame_content() {
        // Left half dark, right half light; shifting right by 10 px leaves
        // uncovered columns white at the left edge.
        let mut bytes = Vec::new();
        for x in 0..2 {
            let v = if x == 0 { 0 } else { 200 };
            bytes.extend_from_slice(&[v, v, v, 255]);
        }
        let frame = Raster::from_rgba8(2, 1, &bytes).unwrap();
        let frames = [Frame::new("a", &frame).with_offset(10, 0)];
        let mut out = Raster::default();
        interlace(&mut out, &frames, &job_one_inch(), &MarkStyle::default()).unwrap();
        assert_eq!(out.get(5, 0), Some(WHITE));
        assert_eq!(out.get(10, 0), Some([0, 0, 0, 255]));
        assert_eq!(out.get(309, 0), Some([0, 0, 0, 255]));
        assert_eq!(out.get(310, 0), Some([200, 200, 200, 255]));
    }

    #[test]
    fn test_reused_surface_is_cleared() {
        let a = Raster::filled(2, 2, RED);
        let frames = [Frame::new("a", &a)];
        let job = job_one_inch();
        let layout = job.layout();
        let mut out = Raster::filled(layout.canvas_width().unwrap(), layout.canvas_height().unwrap(), BLUE);
        interlace(&mut out, &frames, &job, &MarkStyle::default()).unwrap();
        assert!(out.pixels().iter().all(|p| *p == RED));
    }

    #[test]
    fn test_right_to_left_reverses_resolved_order() {
        let a = Raster::filled(1, 1, RED);
        let b = Raster::filled(1, 1, BLUE);
        let frames = [Frame::new("a", &a), Frame::new("b", &b).with_offset(3, -1)];
        let resolved = resolve_frames(&frames, Direction::RightToLeft).unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(std::ptr::eq(resolved[0].0, &b));
        assert_eq!(resolved[0].1, IVec2::new(3, -1));
        assert!(std::ptr::eq(resolved[1].0, &a));
    }

    #[test]
    fn test_canvas_overflow_is_an_allocation_error() {
        // content and left margin are each ~2.36e9 px wide; together they overflow u32
        let job = JobSettings {
            width_mm: 1e8,
            margin_left_mm: 1e8,
            ..job_one_inch()
        };
        assert!(job.validate().is_ok());
        let a = Raster::filled(2, 2, RED);
        let frames = [Frame::new("a", &a)];
        let mut out = Raster::filled(3, 3, BLUE);
        let err = interlace(&mut out, &frames, &job, &MarkStyle::default()).unwrap_err();
        assert!(matches!(err, LenticuleError::Allocation { .. }));
        assert_eq!(out, Raster::filled(3, 3, BLUE));
    }
}
