//! Simulated view of the finished print from a moving eye position.
//!
//! The eye slides along a line parallel to the print, `viewing_distance_mm`
//! in front of it. For every block of output columns the ray from the eye to
//! that point of the print gives a viewing angle; the angle, taken modulo the
//! lens field of view, selects a position in the frame sequence.
//!
//! ```text
//!   eye_x   = (sim_x − ½) · movement_range
//!   print_x = (column / width − ½) · print_width
//!   angle   = atan2(print_x − eye_x, viewing_distance)
//!   t       = wrap(angle / fov + ½)             ∈ [0, 1)
//!   pos     = t · (frame_count − 1)
//! ```

pub mod postfx;

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::geometry::field_of_view;
use crate::raster::{Raster, Rect, Rgba};
use crate::settings::{Direction, JobSettings, PhysicsSettings};
use crate::text;

const BACKGROUND: Rgba = [0, 0, 0, 255];
const ERROR_BACKGROUND: Rgba = [38, 18, 22, 255];
const ERROR_INK: Rgba = [235, 80, 80, 255];

/// Outcome of one [`render_simulation`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationStatus {
    /// Frames were drawn.
    Rendered {
        fov_degrees: f64,
        /// Sequence position seen at the centre of the print.
        center_position: f64,
        postfx_applied: bool,
    },
    /// Lens optics have no valid viewing cone; an error indicator was drawn.
    InvalidOptics,
    /// No frames were supplied; an error indicator was drawn.
    NoFrames,
}

/// Fractional position in a sequence of `frame_count` frames seen at
/// `angle_deg` through a lens with the given field of view.
pub fn frame_position(angle_deg: f64, fov_deg: f64, frame_count: usize, direction: Direction) -> f64 {
    if frame_count < 2 || fov_deg <= 0.0 {
        return 0.0;
    }
    let mut t = wrap_unit(angle_deg / fov_deg + 0.5);
    // Mirrored into (0, 1] so the wrap seam lands on the last frame.
    if direction == Direction::RightToLeft {
        t = 1.0 - t;
    }
    t * (frame_count - 1) as f64
}

fn wrap_unit(t: f64) -> f64 {
    let w = t - t.floor();
    if w >= 1.0 { 0.0 } else { w }
}

/// Viewing angle in degrees from the eye to a point on the print, both in mm.
pub fn viewing_angle(print_x_mm: f64, eye_x_mm: f64, distance_mm: f64) -> f64 {
    (print_x_mm - eye_x_mm).atan2(distance_mm).to_degrees()
}

fn draw_error(surface: &mut Raster, message: &str) {
    surface.fill(ERROR_BACKGROUND);
    let (w, h) = (surface.width() as i64, surface.height() as i64);
    let scale = if text::measure(message, 2).0 as i64 + 16 <= w { 2 } else { 1 };
    let (tw, th) = text::measure(message, scale);
    text::draw_text(surface, (w - tw as i64) / 2, (h - th as i64) / 2, message, scale, ERROR_INK);
}

/// Render the view seen from eye position `sim_x` (0 = far left, 1 = far
/// right) into `surface`, resized to `width x height`.
///
/// Invalid optics or an empty frame list are reported through the returned
/// status after drawing an error indicator; they are not errors.
#[allow(clippy::too_many_arguments)]
pub fn render_simulation(
    surface: &mut Raster,
    width: u32,
    height: u32,
    frames: &[&Raster],
    job: &JobSettings,
    physics: &PhysicsSettings,
    sim_x: f64,
    config: &SimulationConfig,
) -> Result<SimulationStatus> {
    surface.resize(width, height)?;

    let fov = field_of_view(
        job.lpi,
        physics.radius_microns,
        physics.thickness_microns,
        physics.refractive_index,
    );
    if fov <= 0.0 {
        tracing::warn!(lpi = job.lpi, "lens geometry has no viewing cone, simulation suppressed");
        draw_error(surface, "INVALID LENS GEOMETRY");
        return Ok(SimulationStatus::InvalidOptics);
    }
    if frames.is_empty() {
        draw_error(surface, "NO FRAMES");
        return Ok(SimulationStatus::NoFrames);
    }

    surface.fill(BACKGROUND);
    if width == 0 || height == 0 {
        return Ok(SimulationStatus::Rendered {
            fov_degrees: fov,
            center_position: 0.0,
            postfx_applied: false,
        });
    }

    let n = frames.len();
    let eye_x = (sim_x.clamp(0.0, 1.0) - 0.5) * config.movement_range_mm;
    let distance = physics.viewing_distance_mm;
    let stride = config.column_stride.max(1);
    let dest = Rect::new(0.0, 0.0, width as f64, height as f64);

    for x0 in (0..width).step_by(stride as usize) {
        let block = stride.min(width - x0);
        let center = x0 as f64 + block as f64 / 2.0;
        let print_x = (center / width as f64 - 0.5) * job.width_mm;
        let pos = frame_position(viewing_angle(print_x, eye_x, distance), fov, n, job.direction);

        let i0 = (pos.floor() as usize).min(n - 1);
        let i1 = (i0 + 1).min(n - 1);
        let weight = pos - i0 as f64;
        let clip = Rect::new(x0 as f64, 0.0, block as f64, height as f64);

        surface.draw_scaled_clipped(frames[i0], dest, clip);
        if i1 != i0 && weight > config.blend_threshold {
            surface.blend_scaled_clipped(frames[i1], dest, clip, weight);
        }
    }

    let center_position = frame_position(viewing_angle(0.0, eye_x, distance), fov, n, job.direction);

    let pixels = width as u64 * height as u64;
    let postfx_applied = pixels <= config.postfx_pixel_budget;
    if postfx_applied {
        *surface = postfx::apply(surface, config);
    } else {
        tracing::debug!(pixels, budget = config.postfx_pixel_budget, "skipping post effects");
    }

    Ok(SimulationStatus::Rendered {
        fov_degrees: fov,
        center_position,
        postfx_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_angle_is_sequence_midpoint() {
        assert!((frame_position(0.0, 30.0, 3, Direction::LeftToRight) - 1.0).abs() < 1e-12);
        assert!((frame_position(0.0, 30.0, 5, Direction::LeftToRight) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_position_wraps_past_fov() {
        let a = frame_position(5.0, 30.0, 4, Direction::LeftToRight);
        let b = frame_position(35.0, 30.0, 4, Direction::LeftToRight);
        assert!((a - b).abs() < 1e-9);
        assert!((0.0..3.0).contains(&b));
    }

    #[test]
    fn test_right_to_left_mirrors_position() {
        let lr = frame_position(6.0, 30.0, 3, Direction::LeftToRight);
        let rl = frame_position(6.0, 30.0, 3, Direction::RightToLeft);
        assert!((lr + rl - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_right_to_left_mirrors_at_wrap_seam() {
        // -15 deg is exactly half the cone: t wraps to 0
        assert_eq!(frame_position(-15.0, 30.0, 3, Direction::LeftToRight), 0.0);
        assert_eq!(frame_position(-15.0, 30.0, 3, Direction::RightToLeft), 2.0);
        for angle in [-45.0, -15.0, 0.0, 7.5, 14.9, 29.0] {
            let lr = frame_position(angle, 30.0, 4, Direction::LeftToRight);
            let rl = frame_position(angle, 30.0, 4, Direction::RightToLeft);
            assert!((lr + rl - 3.0).abs() < 1e-9, "angle {angle}: {lr} + {rl}");
        }
    }

    #[test]
    fn test_single_frame_always_position_zero() {
        assert_eq!(frame_position(12.0, 30.0, 1, Direction::LeftToRight), 0.0);
    }

    #[test]
    fn test_invalid_optics_draws_indicator() {
        let frame = Raster::filled(4, 4, [255, 255, 255, 255]);
        let physics = PhysicsSettings {
            radius_microns: 100.0,
            ..PhysicsSettings::default()
        };
        let mut surface = Raster::default();
        let status = render_simulation(
            &mut surface,
            64,
            32,
            &[&frame],
            &JobSettings::default(),
            &physics,
            0.5,
            &SimulationConfig::default(),
        )
        .unwrap();
        assert_eq!(status, SimulationStatus::InvalidOptics);
        assert_eq!(surface.get(0, 0), Some(ERROR_BACKGROUND));
        assert!(surface.pixels().iter().any(|p| *p == ERROR_INK));
        assert!(!surface.pixels().contains(&[255, 255, 255, 255]));
    }

    #[test]
    fn test_empty_frames_draws_indicator() {
        let mut surface = Raster::default();
        let status = render_simulation(
            &mut surface,
            64,
            32,
            &[],
            &JobSettings::default(),
            &PhysicsSettings::default(),
            0.5,
            &SimulationConfig::default(),
        )
        .unwrap();
        assert_eq!(status, SimulationStatus::NoFrames);
        assert_eq!(surface.get(0, 0), Some(ERROR_BACKGROUND));
    }
}
