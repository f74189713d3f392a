//! Per-call settings snapshots and the frames they are applied to.
//!
//! All settings are plain values. The engine reads them for the duration of
//! one call and keeps nothing afterwards.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::{LenticuleError, Result};
use crate::raster::Raster;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// One source view of the lenticular sequence.
///
/// The raster is owned by the caller; `None` marks a frame whose source has
/// not finished decoding.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// Caller-side identifier, reported back in errors.
    pub id: String,
    pub raster: Option<&'a Raster>,
    /// Registration offset in output pixels, applied at composite time.
    pub offset: IVec2,
}

impl<'a> Frame<'a> {
    pub fn new(id: impl Into<String>, raster: &'a Raster) -> Self {
        Self {
            id: id.into(),
            raster: Some(raster),
            offset: IVec2::ZERO,
        }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = IVec2::new(x, y);
        self
    }

    pub fn width(&self) -> u32 {
        self.raster.map_or(0, Raster::width)
    }

    pub fn height(&self) -> u32 {
        self.raster.map_or(0, Raster::height)
    }
}

/// Where registration marks are placed relative to the content box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlignmentMode {
    /// Centre and edge patterns, vertically centred in the margins.
    #[default]
    External,
    /// Centre patterns only.
    Internal,
    /// Centre and edge patterns straddling the content boundary.
    EdgeCentered,
}

/// Order in which frames are laid out under each lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "LR", alias = "leftToRight")]
    LeftToRight,
    #[serde(rename = "RL", alias = "rightToLeft")]
    RightToLeft,
}

/// Print job description: physical size, output resolution and lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSettings {
    pub width_mm: f64,
    pub height_mm: f64,
    /// Horizontal output resolution (pixels per inch).
    pub ppi_x: f64,
    /// Vertical output resolution (pixels per inch).
    pub ppi_y: f64,
    /// Lens pitch in lines per inch.
    pub lpi: f64,
    pub margin_top_mm: f64,
    pub margin_right_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub alignment: AlignmentMode,
    pub direction: Direction,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            width_mm: 100.0,
            height_mm: 150.0,
            ppi_x: 600.0,
            ppi_y: 600.0,
            lpi: 60.0,
            margin_top_mm: 0.0,
            margin_right_mm: 0.0,
            margin_bottom_mm: 0.0,
            margin_left_mm: 0.0,
            alignment: AlignmentMode::External,
            direction: Direction::LeftToRight,
        }
    }
}

/// Pixel geometry derived from a [`JobSettings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintLayout {
    pub content_width: u32,
    pub content_height: u32,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    /// Output pixels under one lens ridge (`ppi_x / lpi`), fractional.
    pub pixels_per_pitch: f64,
}

impl PrintLayout {
    /// Content plus side margins, or `None` when the sum overflows `u32`.
    pub fn canvas_width(&self) -> Option<u32> {
        self.margin_left
            .checked_add(self.content_width)?
            .checked_add(self.margin_right)
    }

    /// Content plus top and bottom margins, or `None` on overflow.
    pub fn canvas_height(&self) -> Option<u32> {
        self.margin_top
            .checked_add(self.content_height)?
            .checked_add(self.margin_bottom)
    }

    /// Full canvas size; a canvas that cannot be addressed is an allocation failure.
    pub fn canvas_size(&self) -> Result<(u32, u32)> {
        match (self.canvas_width(), self.canvas_height()) {
            (Some(width), Some(height)) => Ok((width, height)),
            (width, height) => Err(LenticuleError::Allocation {
                width: width.unwrap_or(u32::MAX),
                height: height.unwrap_or(u32::MAX),
            }),
        }
    }

    /// Number of lenses needed to cover the content width.
    pub fn lens_count(&self) -> u32 {
        (self.content_width as f64 / self.pixels_per_pitch).ceil() as u32
    }

    pub fn has_margins(&self) -> bool {
        self.margin_top > 0 || self.margin_right > 0 || self.margin_bottom > 0 || self.margin_left > 0
    }
}

/// Convert a physical length to a pixel count, rounding up.
pub fn mm_to_px(mm: f64, ppi: f64) -> u32 {
    (mm / MM_PER_INCH * ppi).ceil().max(0.0) as u32
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LenticuleError::InvalidSettings(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LenticuleError::InvalidSettings(format!(
            "{name} must not be negative, got {value}"
        )))
    }
}

impl JobSettings {
    pub fn validate(&self) -> Result<()> {
        require_positive("width_mm", self.width_mm)?;
        require_positive("height_mm", self.height_mm)?;
        require_positive("ppi_x", self.ppi_x)?;
        require_positive("ppi_y", self.ppi_y)?;
        require_positive("lpi", self.lpi)?;
        require_non_negative("margin_top_mm", self.margin_top_mm)?;
        require_non_negative("margin_right_mm", self.margin_right_mm)?;
        require_non_negative("margin_bottom_mm", self.margin_bottom_mm)?;
        require_non_negative("margin_left_mm", self.margin_left_mm)?;
        Ok(())
    }

    /// Content and margin sizes in output pixels.
    pub fn layout(&self) -> PrintLayout {
        PrintLayout {
            content_width: mm_to_px(self.width_mm, self.ppi_x),
            content_height: mm_to_px(self.height_mm, self.ppi_y),
            margin_top: mm_to_px(self.margin_top_mm, self.ppi_y),
            margin_right: mm_to_px(self.margin_right_mm, self.ppi_x),
            margin_bottom: mm_to_px(self.margin_bottom_mm, self.ppi_y),
            margin_left: mm_to_px(self.margin_left_mm, self.ppi_x),
            pixels_per_pitch: self.ppi_x / self.lpi,
        }
    }
}

/// Pitch test chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalibrationSettings {
    pub center_lpi: f64,
    pub strip_count: u32,
    /// LPI increment between neighbouring strips.
    pub step_lpi: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            center_lpi: 60.0,
            strip_count: 11,
            step_lpi: 0.1,
        }
    }
}

impl CalibrationSettings {
    pub fn validate(&self) -> Result<()> {
        require_positive("center_lpi", self.center_lpi)?;
        if self.strip_count == 0 {
            return Err(LenticuleError::InvalidSettings(
                "strip_count must be at least 1".into(),
            ));
        }
        if !self.step_lpi.is_finite() {
            return Err(LenticuleError::InvalidSettings("step_lpi must be finite".into()));
        }
        let lowest = self.lpi_for_strip(0).min(self.lpi_for_strip(self.strip_count - 1));
        require_positive("lowest strip lpi", lowest)
    }

    /// LPI tested by strip `index` (0 at the top).
    pub fn lpi_for_strip(&self, index: u32) -> f64 {
        let centre = (self.strip_count / 2) as f64;
        self.center_lpi + (index as f64 - centre) * self.step_lpi
    }
}

/// Lens material and viewing geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsSettings {
    pub radius_microns: f64,
    pub thickness_microns: f64,
    pub refractive_index: f64,
    pub viewing_distance_mm: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            radius_microns: 250.0,
            thickness_microns: 450.0,
            refractive_index: 1.49,
            viewing_distance_mm: 600.0,
        }
    }
}

impl PhysicsSettings {
    pub fn validate(&self) -> Result<()> {
        require_positive("radius_microns", self.radius_microns)?;
        require_positive("thickness_microns", self.thickness_microns)?;
        require_positive("refractive_index", self.refractive_index)?;
        require_positive("viewing_distance_mm", self.viewing_distance_mm)
    }
}
