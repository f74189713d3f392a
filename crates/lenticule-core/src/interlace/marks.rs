//! Registration and crop marks drawn into the print margins.

use crate::config::MarkStyle;
use crate::raster::{Raster, Rgba};
use crate::settings::{AlignmentMode, PrintLayout};

/// Vertical extent of a registration pattern row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Band {
    top: f64,
    height: f64,
}

/// Light patch with a bold centre tick and bold ticks one and two pitches
/// to either side of `cx`.
fn draw_registration(surface: &mut Raster, cx: f64, band: Band, pitch: f64, style: &MarkStyle) {
    let patch_h = (band.height * 0.6).max(1.0);
    let patch_top = band.top + (band.height - patch_h) / 2.0;
    let reach = 2.0 * pitch + style.patch_padding as f64 + style.pitch_tick_width as f64;
    fill(surface, cx - reach, patch_top, 2.0 * reach, patch_h, style.background);

    let center_w = style.center_tick_width as f64;
    fill(surface, cx - center_w / 2.0, patch_top, center_w, patch_h, style.tick_color);

    let tick_w = style.pitch_tick_width as f64;
    let tick_h = (patch_h * 0.7).max(1.0);
    let tick_top = patch_top + (patch_h - tick_h) / 2.0;
    for k in [-2.0, -1.0, 1.0, 2.0] {
        let x = cx + k * pitch;
        fill(surface, x - tick_w / 2.0, tick_top, tick_w, tick_h, style.tick_color);
    }
}

fn fill(surface: &mut Raster, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
    let x0 = x.round() as i64;
    let y0 = y.round() as i64;
    let x1 = (x + w).round() as i64;
    let y1 = (y + h).round() as i64;
    surface.fill_rect(x0, y0, (x1 - x0).max(1), (y1 - y0).max(1), color);
}

/// Rows used for the top and bottom patterns, or `None` where that margin is empty.
fn bands(layout: &PrintLayout, mode: AlignmentMode) -> [Option<Band>; 2] {
    let top_edge = layout.margin_top as f64;
    let bottom_edge = layout.margin_top as f64 + layout.content_height as f64;
    let (mt, mb) = (layout.margin_top as f64, layout.margin_bottom as f64);

    let top = (layout.margin_top > 0).then(|| match mode {
        AlignmentMode::EdgeCentered => Band {
            top: top_edge - mt / 2.0,
            height: mt,
        },
        _ => Band {
            top: 0.0,
            height: mt,
        },
    });
    let bottom = (layout.margin_bottom > 0).then(|| match mode {
        AlignmentMode::EdgeCentered => Band {
            top: bottom_edge - mb / 2.0,
            height: mb,
        },
        _ => Band {
            top: bottom_edge,
            height: mb,
        },
    });
    [top, bottom]
}

/// Horizontal centres of the registration patterns for `mode`.
pub fn pattern_centers(layout: &PrintLayout, mode: AlignmentMode) -> Vec<f64> {
    let left = layout.margin_left as f64;
    let width = layout.content_width as f64;
    let pitch = layout.pixels_per_pitch;
    let mut centers = vec![left + width / 2.0];
    if mode != AlignmentMode::Internal {
        centers.push(left + 2.0 * pitch);
        centers.push(left + width - 2.0 * pitch);
    }
    centers
}

/// Draw the registration patterns at the top and bottom margins.
pub fn draw_alignment_marks(
    surface: &mut Raster,
    layout: &PrintLayout,
    mode: AlignmentMode,
    style: &MarkStyle,
) {
    let centers = pattern_centers(layout, mode);
    for band in bands(layout, mode).into_iter().flatten() {
        for &cx in &centers {
            draw_registration(surface, cx, band, layout.pixels_per_pitch, style);
        }
    }
}

/// Right-angle brackets at the four content corners, pointing outward.
pub fn draw_crop_marks(surface: &mut Raster, layout: &PrintLayout, style: &MarkStyle) {
    let len = style.crop_length as i64;
    let x0 = layout.margin_left as i64;
    let y0 = layout.margin_top as i64;
    let x1 = x0 + layout.content_width as i64;
    let y1 = y0 + layout.content_height as i64;
    let color = style.crop_color;

    // (horizontal start, vertical start, horizontal row, vertical column)
    let corners = [
        (x0 - len, y0 - len, y0 - 1, x0 - 1),
        (x1, y0 - len, y0 - 1, x1),
        (x0 - len, y1, y1, x0 - 1),
        (x1, y1, y1, x1),
    ];
    for (hx, vy, row, col) in corners {
        surface.fill_rect(hx, row, len, 1, color);
        surface.fill_rect(col, vy, 1, len, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BLACK, WHITE};

    fn layout() -> PrintLayout {
        PrintLayout {
            content_width: 200,
            content_height: 100,
            margin_top: 40,
            margin_right: 30,
            margin_bottom: 40,
            margin_left: 30,
            pixels_per_pitch: 10.0,
        }
    }

    #[test]
    fn test_crop_marks_stay_outside_content() {
        let l = layout();
        let mut r = Raster::filled(l.canvas_width().unwrap(), l.canvas_height().unwrap(), WHITE);
        draw_crop_marks(&mut r, &l, &MarkStyle::default());

        assert_eq!(r.get(29, 39), Some(BLACK));
        assert_eq!(r.get(10, 39), Some(BLACK));
        assert_eq!(r.get(9, 39), Some(WHITE));
        assert_eq!(r.get(29, 20), Some(BLACK));
        assert_eq!(r.get(230, 140), Some(BLACK));
        assert_eq!(r.get(249, 140), Some(BLACK));
        assert_eq!(r.get(230, 159), Some(BLACK));
        for y in 40..140 {
            for x in 30..230 {
                assert_eq!(r.get(x, y), Some(WHITE));
            }
        }
    }

    #[test]
    fn test_internal_mode_draws_center_pattern_only() {
        let l = layout();
        assert_eq!(pattern_centers(&l, AlignmentMode::Internal), vec![130.0]);
        assert_eq!(
            pattern_centers(&l, AlignmentMode::External),
            vec![130.0, 50.0, 210.0]
        );
    }

    #[test]
    fn test_external_marks_draw_ticks_in_margins() {
        let l = layout();
        let style = MarkStyle::default();
        let mut r = Raster::filled(l.canvas_width().unwrap(), l.canvas_height().unwrap(), WHITE);
        draw_alignment_marks(&mut r, &l, AlignmentMode::External, &style);

        // centre tick at x = 130, band 0..40, patch 8..32
        assert_eq!(r.get(130, 20), Some(style.tick_color));
        // pitch ticks one and two pitches out
        assert_eq!(r.get(140, 20), Some(style.tick_color));
        assert_eq!(r.get(110, 20), Some(style.tick_color));
        // light patch between ticks
        assert_eq!(r.get(135, 20), Some(style.background));
        // bottom margin too
        assert_eq!(r.get(130, 160), Some(style.tick_color));
        // content untouched
        assert_eq!(r.get(130, 90), Some(WHITE));
    }

    #[test]
    fn test_edge_centered_marks_straddle_content_edge() {
        let l = layout();
        let style = MarkStyle::default();
        let mut r = Raster::filled(l.canvas_width().unwrap(), l.canvas_height().unwrap(), WHITE);
        draw_alignment_marks(&mut r, &l, AlignmentMode::EdgeCentered, &style);
        assert_eq!(r.get(130, 35), Some(style.tick_color));
        assert_eq!(r.get(130, 45), Some(style.tick_color));
    }
}
