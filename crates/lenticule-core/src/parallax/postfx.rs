//! Optical post-effects for the simulated view.
//!
//! Each effect reads one raster and returns a new one, so no pass ever reads
//! pixels it has already written.

use glam::DVec2;

use crate::config::SimulationConfig;
use crate::raster::Raster;

/// Multiply even rows by `factors[0]` and odd rows by `factors[1]`.
pub fn scanlines(src: &Raster, factors: [f64; 2]) -> Raster {
    let mut out = src.clone();
    for y in 0..src.height() {
        let f = factors[(y % 2) as usize];
        for x in 0..src.width() {
            if let Some(px) = src.get(x, y) {
                out.put(x as i64, y as i64, scale_rgb(px, f));
            }
        }
    }
    out
}

/// Sample red `offset` pixels to the left and blue `offset` pixels to the
/// right, clamped to the row.
pub fn chromatic_aberration(src: &Raster, offset: u32) -> Raster {
    let mut out = src.clone();
    let w = src.width();
    if w == 0 {
        return out;
    }
    for y in 0..src.height() {
        let row = src.row(y);
        for x in 0..w {
            let rx = x.saturating_sub(offset) as usize;
            let bx = (x.saturating_add(offset)).min(w - 1) as usize;
            let mut px = row[x as usize];
            px[0] = row[rx][0];
            px[2] = row[bx][2];
            out.put(x as i64, y as i64, px);
        }
    }
    out
}

/// Darkening factor of the radial vignette at normalised radius `r`
/// (0 at the centre, 1 at the corners).
pub fn vignette_factor(r: f64, inner: f64, strength: f64) -> f64 {
    if r <= inner {
        return 1.0;
    }
    let t = ((r - inner) / (1.0 - inner).max(f64::EPSILON)).min(1.0);
    1.0 - strength.clamp(0.0, 1.0) * t
}

/// Multiply by a radial gradient: clear near the centre, darker at the edges.
pub fn vignette(src: &Raster, inner: f64, strength: f64) -> Raster {
    let mut out = src.clone();
    let center = DVec2::new(src.width() as f64, src.height() as f64) / 2.0;
    let max_r = center.length();
    if max_r <= 0.0 {
        return out;
    }
    for y in 0..src.height() {
        for x in 0..src.width() {
            let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let f = vignette_factor(p.distance(center) / max_r, inner, strength);
            if let Some(px) = src.get(x, y) {
                out.put(x as i64, y as i64, scale_rgb(px, f));
            }
        }
    }
    out
}

/// Scanlines, then chromatic aberration, then vignette.
pub fn apply(src: &Raster, config: &SimulationConfig) -> Raster {
    let lined = scanlines(src, config.scanline_factors);
    let split = chromatic_aberration(&lined, config.aberration_offset);
    vignette(&split, config.vignette_inner, config.vignette_strength)
}

fn scale_rgb(px: [u8; 4], f: f64) -> [u8; 4] {
    let s = |c: u8| (c as f64 * f).round().clamp(0.0, 255.0) as u8;
    [s(px[0]), s(px[1]), s(px[2]), px[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanlines_alternate_rows() {
        let src = Raster::filled(2, 2, [200, 100, 50, 255]);
        let out = scanlines(&src, [1.0, 0.5]);
        assert_eq!(out.get(0, 0), Some([200, 100, 50, 255]));
        assert_eq!(out.get(1, 1), Some([100, 50, 25, 255]));
        // source untouched
        assert_eq!(src.get(1, 1), Some([200, 100, 50, 255]));
    }

    #[test]
    fn test_aberration_clamps_within_row() {
        // Row 0: red ramp; row 1: solid, must not bleed into row 0.
        let mut bytes = Vec::new();
        for x in 0..4u8 {
            bytes.extend_from_slice(&[x * 10, 0, x * 10, 255]);
        }
        for _ in 0..4 {
            bytes.extend_from_slice(&[250, 0, 250, 255]);
        }
        let src = Raster::from_rgba8(4, 2, &bytes).unwrap();
        let out = chromatic_aberration(&src, 2);
        // x=0: red from x=0 (clamped), blue from x=2
        assert_eq!(out.get(0, 0), Some([0, 0, 20, 255]));
        // x=3: red from x=1, blue clamped to x=3
        assert_eq!(out.get(3, 0), Some([10, 0, 30, 255]));
        assert_eq!(out.get(3, 1), Some([250, 0, 250, 255]));
    }

    #[test]
    fn test_vignette_clear_center_dark_corner() {
        let src = Raster::filled(100, 100, [200, 200, 200, 255]);
        let out = vignette(&src, 0.35, 0.65);
        assert_eq!(out.get(50, 50), Some([200, 200, 200, 255]));
        let corner = out.get(0, 0).unwrap();
        assert!(corner[0] < 100, "corner = {corner:?}");
        assert_eq!(corner[3], 255);
    }

    #[test]
    fn test_vignette_factor_bounds() {
        assert_eq!(vignette_factor(0.0, 0.35, 0.65), 1.0);
        assert!((vignette_factor(1.0, 0.35, 0.65) - 0.35).abs() < 1e-12);
        assert!((vignette_factor(2.0, 0.35, 0.65) - 0.35).abs() < 1e-12);
    }
}
