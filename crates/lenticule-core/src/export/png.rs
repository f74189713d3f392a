//! PNG encoding for previews and screen export.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{LenticuleError, Result};
use crate::raster::Raster;

/// Encode `raster` as an 8-bit RGBA PNG.
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    if raster.is_empty() {
        return Err(LenticuleError::InvalidRaster {
            width: raster.width(),
            height: raster.height(),
            reason: "cannot encode an empty raster",
        });
    }
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        raster.as_bytes(),
        raster.width(),
        raster.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}
