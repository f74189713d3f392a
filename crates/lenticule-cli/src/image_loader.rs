//! Frame loading and format conversion for the command-line host.

use std::path::Path;

use lenticule_core::Raster;

/// Load an image from disk and convert it to an RGBA8 [`Raster`].
///
/// Supports the formats enabled on the `image` crate (PNG, JPEG, TIFF,
/// BMP, WebP).
pub fn load_raster(path: &Path) -> Result<Raster, ImageLoadError> {
    let img = image::open(path).map_err(ImageLoadError::Decode)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!("loaded {} ({}x{})", path.display(), width, height);
    Ok(Raster::from_rgba8(width, height, rgba.as_raw())?)
}

/// Errors that can occur during image loading.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error(transparent)]
    Raster(#[from] lenticule_core::LenticuleError),
}
