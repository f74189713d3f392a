//! Byte-level export of finished rasters.

pub mod png;
pub mod tiff;

pub use png::encode_png;
pub use tiff::{TiffLayout, encode_tiff};
