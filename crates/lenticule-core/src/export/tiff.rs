//! Baseline uncompressed RGB TIFF writer.
//!
//! Layout (little-endian, classic TIFF):
//!
//! ```text
//!   0        header: "II", 42, offset of IFD
//!   8        pixel data, RGB triplets, one strip, alpha dropped (N bytes)
//!   8+N      [1 pad byte when N is odd]
//!   V        XResolution  (RATIONAL: round(ppi·100) / 100)
//!   V+8      YResolution  (RATIONAL)
//!   V+16     BitsPerSample (3 × SHORT: 8, 8, 8)
//!   V+22     IFD: entry count (12), 12 × 12-byte entries, next-IFD offset 0
//! ```
//!
//! The pad keeps every offset the directory points at on a word boundary;
//! StripByteCounts still reports N.

use crate::error::{LenticuleError, Result};
use crate::raster::Raster;

const HEADER_LEN: u32 = 8;
const RATIONAL_LEN: u32 = 8;
const BITS_PER_SAMPLE_LEN: u32 = 6;
const ENTRY_COUNT: u16 = 12;
const IFD_LEN: u32 = 2 + ENTRY_COUNT as u32 * 12 + 4;
const RESOLUTION_DENOMINATOR: u32 = 100;

mod tag {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const X_RESOLUTION: u16 = 282;
    pub const Y_RESOLUTION: u16 = 283;
    pub const RESOLUTION_UNIT: u16 = 296;
}

/// TIFF field types used by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
enum FieldType {
    Short = 3,
    Long = 4,
    Rational = 5,
}

/// Byte offsets of every block in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffLayout {
    pub pixel_offset: u32,
    pub pixel_len: u32,
    pub x_resolution_offset: u32,
    pub y_resolution_offset: u32,
    pub bits_per_sample_offset: u32,
    pub ifd_offset: u32,
    pub total_len: u32,
}

impl TiffLayout {
    /// Plan the file for a `width x height` image, rejecting sizes whose
    /// offsets would not fit the 32-bit fields.
    pub fn plan(width: u32, height: u32) -> Result<Self> {
        let overflow = |reason| LenticuleError::EncodingOverflow {
            width,
            height,
            reason,
        };
        if width == 0 || height == 0 {
            return Err(overflow("image has no pixels"));
        }
        let pixel_len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| overflow("pixel data exceeds 4 GiB"))?;
        let x_resolution_offset = HEADER_LEN
            .checked_add(pixel_len)
            .and_then(|end| end.checked_add(end % 2))
            .ok_or_else(|| overflow("pixel data exceeds 4 GiB"))?;
        let ifd_offset = x_resolution_offset
            .checked_add(2 * RATIONAL_LEN + BITS_PER_SAMPLE_LEN)
            .ok_or_else(|| overflow("tag values exceed 4 GiB"))?;
        let total_len = ifd_offset
            .checked_add(IFD_LEN)
            .ok_or_else(|| overflow("directory exceeds 4 GiB"))?;
        Ok(Self {
            pixel_offset: HEADER_LEN,
            pixel_len,
            x_resolution_offset,
            y_resolution_offset: x_resolution_offset + RATIONAL_LEN,
            bits_per_sample_offset: x_resolution_offset + 2 * RATIONAL_LEN,
            ifd_offset,
            total_len,
        })
    }
}

/// Resolution as the rational `round(ppi·100) / 100`.
pub fn resolution_rational(ppi: f64) -> (u32, u32) {
    let numerator = (ppi * RESOLUTION_DENOMINATOR as f64).round();
    let numerator = if numerator.is_finite() {
        numerator.clamp(0.0, u32::MAX as f64) as u32
    } else {
        0
    };
    (numerator, RESOLUTION_DENOMINATOR)
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_entry(buf: &mut Vec<u8>, tag: u16, kind: FieldType, count: u32, value: u32) {
    put_u16(buf, tag);
    put_u16(buf, kind as u16);
    put_u32(buf, count);
    match kind {
        // SHORT values sit left-justified in the 4-byte value field.
        FieldType::Short if count == 1 => {
            put_u16(buf, value as u16);
            put_u16(buf, 0);
        }
        _ => put_u32(buf, value),
    }
}

/// Serialise `raster` as an uncompressed RGB TIFF with the given pixel
/// densities (pixels per inch).
///
/// Channel values are copied verbatim; alpha is dropped.
pub fn encode_tiff(raster: &Raster, ppi_x: f64, ppi_y: f64) -> Result<Vec<u8>> {
    let (width, height) = (raster.width(), raster.height());
    let layout = TiffLayout::plan(width, height)?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(layout.total_len as usize)
        .map_err(|_| LenticuleError::Allocation { width, height })?;

    // Header
    buf.extend_from_slice(b"II");
    put_u16(&mut buf, 42);
    put_u32(&mut buf, layout.ifd_offset);

    // Pixel data
    for px in raster.pixels() {
        buf.extend_from_slice(&px[..3]);
    }
    if buf.len() % 2 == 1 {
        buf.push(0);
    }
    debug_assert_eq!(buf.len(), layout.x_resolution_offset as usize);

    // Out-of-line values
    for ppi in [ppi_x, ppi_y] {
        let (num, den) = resolution_rational(ppi);
        put_u32(&mut buf, num);
        put_u32(&mut buf, den);
    }
    for _ in 0..3 {
        put_u16(&mut buf, 8);
    }
    debug_assert_eq!(buf.len(), layout.ifd_offset as usize);

    // Image File Directory, ascending tag order
    put_u16(&mut buf, ENTRY_COUNT);
    put_entry(&mut buf, tag::IMAGE_WIDTH, FieldType::Long, 1, width);
    put_entry(&mut buf, tag::IMAGE_LENGTH, FieldType::Long, 1, height);
    put_entry(&mut buf, tag::BITS_PER_SAMPLE, FieldType::Short, 3, layout.bits_per_sample_offset);
    put_entry(&mut buf, tag::COMPRESSION, FieldType::Short, 1, 1);
    put_entry(&mut buf, tag::PHOTOMETRIC_INTERPRETATION, FieldType::Short, 1, 2);
    put_entry(&mut buf, tag::STRIP_OFFSETS, FieldType::Long, 1, layout.pixel_offset);
    put_entry(&mut buf, tag::SAMPLES_PER_PIXEL, FieldType::Short, 1, 3);
    put_entry(&mut buf, tag::ROWS_PER_STRIP, FieldType::Long, 1, height);
    put_entry(&mut buf, tag::STRIP_BYTE_COUNTS, FieldType::Long, 1, layout.pixel_len);
    put_entry(&mut buf, tag::X_RESOLUTION, FieldType::Rational, 1, layout.x_resolution_offset);
    put_entry(&mut buf, tag::Y_RESOLUTION, FieldType::Rational, 1, layout.y_resolution_offset);
    put_entry(&mut buf, tag::RESOLUTION_UNIT, FieldType::Short, 1, 2);
    put_u32(&mut buf, 0);
    debug_assert_eq!(buf.len(), layout.total_len as usize);

    tracing::debug!(width, height, bytes = buf.len(), "encoded TIFF");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_two_by_two() {
        let l = TiffLayout::plan(2, 2).unwrap();
        assert_eq!(l.pixel_len, 12);
        assert_eq!(l.x_resolution_offset, 20);
        assert_eq!(l.y_resolution_offset, 28);
        assert_eq!(l.bits_per_sample_offset, 36);
        assert_eq!(l.ifd_offset, 42);
        assert_eq!(l.total_len, 42 + 150);
    }

    #[test]
    fn test_odd_pixel_count_pads_after_strip() {
        let l = TiffLayout::plan(1, 1).unwrap();
        // 8 + 3 = 11 -> 12
        assert_eq!(l.pixel_len, 3);
        assert_eq!(l.x_resolution_offset, 12);
        assert_eq!(l.y_resolution_offset, 20);
        assert_eq!(l.bits_per_sample_offset, 28);
        assert_eq!(l.ifd_offset, 34);
        let offsets = [l.x_resolution_offset, l.y_resolution_offset, l.bits_per_sample_offset, l.ifd_offset];
        for offset in offsets {
            assert_eq!(offset % 2, 0);
        }

        let bytes = encode_tiff(&Raster::filled(1, 1, [1, 2, 3, 4]), 72.0, 72.0).unwrap();
        assert_eq!(bytes.len(), l.total_len as usize);
        assert_eq!(&bytes[8..12], &[1, 2, 3, 0]);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 7200);
        assert_eq!(u16::from_le_bytes([bytes[28], bytes[29]]), 8);
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        let err = TiffLayout::plan(70_000, 70_000).unwrap_err();
        assert!(matches!(err, LenticuleError::EncodingOverflow { .. }));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        assert!(encode_tiff(&Raster::default(), 300.0, 300.0).is_err());
    }

    #[test]
    fn test_resolution_rounds_to_hundredths() {
        assert_eq!(resolution_rational(300.0), (30000, 100));
        assert_eq!(resolution_rational(72.125), (7213, 100));
        assert_eq!(resolution_rational(f64::NAN), (0, 100));
    }

    #[test]
    fn test_header_and_entry_count() {
        let bytes = encode_tiff(&Raster::filled(2, 2, [9, 8, 7, 6]), 300.0, 300.0).unwrap();
        assert_eq!(&bytes[0..4], &[b'I', b'I', 42, 0]);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 42);
        assert_eq!(u16::from_le_bytes([bytes[42], bytes[43]]), 12);
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }
}
