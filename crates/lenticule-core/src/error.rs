//! Error type shared by every generation path.

/// Errors returned by the print, calibration, simulation and export paths.
///
/// Degenerate lens optics are not represented here: they surface as a
/// field of view of `0.0` (see [`crate::geometry::field_of_view`]).
#[derive(Debug, thiserror::Error)]
pub enum LenticuleError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("at least one frame is required")]
    NoFrames,

    #[error("frame {index} ({id}) has no decoded raster")]
    MissingFrame { index: usize, id: String },

    #[error("invalid raster {width}x{height}: {reason}")]
    InvalidRaster {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    #[error("failed to allocate a {width}x{height} raster")]
    Allocation { width: u32, height: u32 },

    #[error("image {width}x{height} does not fit a classic TIFF: {reason}")]
    EncodingOverflow {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, LenticuleError>;
