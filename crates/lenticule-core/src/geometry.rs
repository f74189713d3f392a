//! Lenticular lens optics: angular field of view from pitch and lens shape.
//!
//! ```text
//!   pitch  p = 25400 / lpi                       (µm)
//!   A      = asin(p / 2r)                        half-angle of the arc
//!   f      = r − √(r² − (p/2)²)                  sagitta
//!   h      = t − f                               effective thickness
//!   R      = A − atan(p / h)
//!   sin I  = n · sin(R) / n_air
//!   FOV    = 2 · (A − I)                         (degrees)
//! ```
//!
//! Geometries that cannot form a viewing cone (pitch wider than the lens,
//! a lens thinner than its own sagitta, total internal reflection) yield
//! `0.0`. Callers treat that value as "configuration invalid for
//! simulation", never as a literal zero-degree cone.

use serde::{Deserialize, Serialize};

/// Refractive index of air used for the exit interface.
pub const AIR_REFRACTIVE_INDEX: f64 = 1.0003;

/// Microns per inch.
const MICRONS_PER_INCH: f64 = 25_400.0;

/// Why a lens geometry produced no viewing cone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegenerateOptics {
    /// Radius or pitch is not positive.
    NonPositiveInput,
    /// Pitch exceeds the lens diameter.
    PitchExceedsDiameter,
    /// Lens is thinner than the sagitta of its curvature.
    TooThin,
    /// Snell's law has no solution at the exit interface.
    TotalInternalReflection,
}

/// Intermediate quantities of the FOV derivation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensGeometry {
    pub pitch_microns: f64,
    /// Half-angle of the lens arc, radians.
    pub half_angle: f64,
    pub sagitta_microns: f64,
    pub effective_thickness_microns: f64,
    /// Internal ray angle, radians.
    pub refracted_angle: f64,
    /// Exit ray angle after refraction into air, radians.
    pub exit_angle: f64,
    pub fov_degrees: f64,
}

/// Run the full derivation, reporting why it failed when it does.
pub fn analyze_lens(
    lpi: f64,
    radius_microns: f64,
    thickness_microns: f64,
    refractive_index: f64,
) -> Result<LensGeometry, DegenerateOptics> {
    let pitch = MICRONS_PER_INCH / lpi;
    let r = radius_microns;
    let positive = r.is_finite() && r > 0.0 && pitch.is_finite() && pitch > 0.0;
    if !positive {
        return Err(DegenerateOptics::NonPositiveInput);
    }
    if pitch > 2.0 * r {
        return Err(DegenerateOptics::PitchExceedsDiameter);
    }

    let half_pitch = pitch / 2.0;
    let half_angle = (half_pitch / r).asin();
    let sagitta = r - (r * r - half_pitch * half_pitch).sqrt();
    let h = thickness_microns - sagitta;
    if h.is_nan() || h <= 0.0 {
        return Err(DegenerateOptics::TooThin);
    }

    let refracted = half_angle - (pitch / h).atan();
    let sin_exit = refractive_index * refracted.sin() / AIR_REFRACTIVE_INDEX;
    if sin_exit.is_nan() || sin_exit.abs() > 1.0 {
        return Err(DegenerateOptics::TotalInternalReflection);
    }
    let exit = sin_exit.asin();

    let fov_degrees = (2.0 * (half_angle - exit)).to_degrees().clamp(0.0, 180.0);
    Ok(LensGeometry {
        pitch_microns: pitch,
        half_angle,
        sagitta_microns: sagitta,
        effective_thickness_microns: h,
        refracted_angle: refracted,
        exit_angle: exit,
        fov_degrees,
    })
}

/// Full viewing-cone angle in degrees, in `[0, 180]`; `0.0` for degenerate optics.
pub fn field_of_view(
    lpi: f64,
    radius_microns: f64,
    thickness_microns: f64,
    refractive_index: f64,
) -> f64 {
    match analyze_lens(lpi, radius_microns, thickness_microns, refractive_index) {
        Ok(lens) => lens.fov_degrees,
        Err(reason) => {
            tracing::debug!(?reason, lpi, radius_microns, thickness_microns, "degenerate lens optics");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typical_lens_has_positive_fov() {
        let fov = field_of_view(60.0, 250.0, 450.0, 1.49);
        assert!(fov > 0.0 && fov <= 180.0, "fov = {fov}");
    }

    #[test]
    fn test_pitch_wider_than_lens_is_zero() {
        // 60 LPI -> 423.3 µm pitch, lens diameter 400 µm
        assert_eq!(field_of_view(60.0, 200.0, 450.0, 1.49), 0.0);
        assert_eq!(
            analyze_lens(60.0, 200.0, 450.0, 1.49),
            Err(DegenerateOptics::PitchExceedsDiameter)
        );
    }

    #[test]
    fn test_too_thin_lens_is_zero() {
        assert_eq!(
            analyze_lens(60.0, 250.0, 50.0, 1.49),
            Err(DegenerateOptics::TooThin)
        );
        assert_eq!(field_of_view(60.0, 250.0, 50.0, 1.49), 0.0);
    }

    #[test]
    fn test_non_positive_radius_is_zero() {
        assert_eq!(field_of_view(60.0, 0.0, 450.0, 1.49), 0.0);
        assert_eq!(field_of_view(60.0, -5.0, 450.0, 1.49), 0.0);
    }

    #[test]
    fn test_total_internal_reflection_is_zero() {
        assert_eq!(
            analyze_lens(60.0, 250.0, 450.0, 40.0),
            Err(DegenerateOptics::TotalInternalReflection)
        );
    }

    #[test]
    fn test_sagitta_matches_circle_segment() {
        let lens = analyze_lens(100.0, 254.0, 500.0, 1.5).unwrap();
        // pitch 254 µm = radius -> sagitta = r (1 - cos 30°)
        let expected = 254.0 * (1.0 - 30f64.to_radians().cos());
        assert!((lens.sagitta_microns - expected).abs() < 1e-9);
        assert!((lens.half_angle - 30f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_fov_range_over_sweep() {
        for lpi in [10.0, 20.0, 40.0, 60.0, 75.0, 100.0, 150.0] {
            for radius in [50.0, 150.0, 250.0, 500.0, 1500.0] {
                for thickness in [100.0, 300.0, 600.0, 2000.0] {
                    for n in [1.0, 1.33, 1.49, 1.6] {
                        let fov = field_of_view(lpi, radius, thickness, n);
                        assert!((0.0..=180.0).contains(&fov));
                        let pitch = 25_400.0 / lpi;
                        if pitch > 2.0 * radius {
                            assert_eq!(fov, 0.0);
                        }
                    }
                }
            }
        }
    }
}
