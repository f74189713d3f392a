//! Tunables for the simulation preview and the print marks.

use serde::{Deserialize, Serialize};

use crate::raster::Rgba;

/// Default column stride of the simulated view, in output pixels.
const DEFAULT_COLUMN_STRIDE: u32 = 4;
/// Default range the simulated eye sweeps across, centred on the print.
const DEFAULT_MOVEMENT_RANGE_MM: f64 = 600.0;
/// Post-processing is skipped above this many output pixels.
const DEFAULT_POSTFX_PIXEL_BUDGET: u64 = 2_000_000;

/// Parameters of the parallax preview renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Output columns are computed in blocks of this width.
    pub column_stride: u32,
    pub movement_range_mm: f64,
    /// Neighbouring frames are mixed in only above this weight.
    pub blend_threshold: f64,
    pub postfx_pixel_budget: u64,
    /// Brightness of even and odd rows.
    pub scanline_factors: [f64; 2],
    /// Red is sampled this many pixels to the left, blue to the right.
    pub aberration_offset: u32,
    /// Fraction of the centre-to-corner distance left untouched by the vignette.
    pub vignette_inner: f64,
    /// Darkening at the corners, `0` (none) to `1` (black).
    pub vignette_strength: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            column_stride: DEFAULT_COLUMN_STRIDE,
            movement_range_mm: DEFAULT_MOVEMENT_RANGE_MM,
            blend_threshold: 0.05,
            postfx_pixel_budget: DEFAULT_POSTFX_PIXEL_BUDGET,
            scanline_factors: [1.0, 0.82],
            aberration_offset: 2,
            vignette_inner: 0.35,
            vignette_strength: 0.65,
        }
    }
}

/// Fixed-size print mark geometry. Sizes are in output pixels and do not
/// scale with resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkStyle {
    pub crop_length: u32,
    pub crop_color: Rgba,
    pub background: Rgba,
    pub tick_color: Rgba,
    pub center_tick_width: u32,
    pub pitch_tick_width: u32,
    /// Padding of the light patch beyond the outermost ticks.
    pub patch_padding: u32,
}

impl Default for MarkStyle {
    fn default() -> Self {
        Self {
            crop_length: 20,
            crop_color: [0, 0, 0, 255],
            background: [235, 235, 235, 255],
            tick_color: [0, 0, 0, 255],
            center_tick_width: 3,
            pitch_tick_width: 2,
            patch_padding: 4,
        }
    }
}
