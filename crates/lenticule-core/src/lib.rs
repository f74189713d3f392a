//! Lenticule Core — lenticular print engine.
//!
//! Interlaces registered frames into print-ready rasters, draws lens pitch
//! calibration charts, simulates the parallax seen through the lens and
//! serialises results as TIFF or PNG. No file I/O; callers hand in decoded
//! rasters and receive rasters or bytes.

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod interlace;
pub mod parallax;
pub mod raster;
pub mod settings;
pub mod text;

// Re-exports for convenience.
pub use config::{MarkStyle, SimulationConfig};
pub use error::{LenticuleError, Result};
pub use export::{encode_png, encode_tiff};
pub use geometry::{analyze_lens, field_of_view};
pub use interlace::{InterlaceReport, interlace, render_calibration_chart};
pub use parallax::{SimulationStatus, render_simulation};
pub use raster::{Raster, Rect, Rgba};
pub use settings::{
    AlignmentMode, CalibrationSettings, Direction, Frame, JobSettings, PhysicsSettings, PrintLayout,
};
