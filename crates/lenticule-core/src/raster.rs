//! Owned RGBA8 raster surface and the pixel-copy primitives built on it.
//!
//! Every generation path writes into a [`Raster`] handed to it by mutable
//! borrow. There is no shared drawing context and no clip stack: compositing
//! a clipped, scaled image is a single explicit call
//! ([`Raster::draw_scaled_clipped`]).

use glam::DVec2;

use crate::error::{LenticuleError, Result};

/// One RGBA8 pixel, straight (non-premultiplied) alpha.
pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];
pub const WHITE: Rgba = [255, 255, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];

/// Axis-aligned rectangle in surface pixel space. Edges may be fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: DVec2,
    pub size: DVec2,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: DVec2::new(x, y),
            size: DVec2::new(width, height),
        }
    }

    /// Far corner (`origin + size`).
    pub fn max(&self) -> DVec2 {
        self.origin + self.size
    }

    /// Overlap of two rectangles. An empty overlap has zero size.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let min = self.origin.max(other.origin);
        let max = self.max().min(other.max());
        Rect {
            origin: min,
            size: (max - min).max(DVec2::ZERO),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open range of pixel indices whose centres fall inside `[lo, hi)`,
    /// clamped to `0..limit`.
    fn covered(lo: f64, hi: f64, limit: u32) -> std::ops::Range<u32> {
        let start = (lo - 0.5).ceil().clamp(0.0, limit as f64) as u32;
        let end = (hi - 0.5).ceil().clamp(0.0, limit as f64) as u32;
        start..end.max(start)
    }
}

/// Row-major RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Default for Raster {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Raster {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wrap decoded RGBA8 bytes (4 bytes per pixel, row-major).
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(bytes.len()) {
            return Err(LenticuleError::InvalidRaster {
                width,
                height,
                reason: "byte length does not match dimensions",
            });
        }
        Ok(Self {
            width,
            height,
            pixels: bytemuck::cast_slice::<u8, Rgba>(bytes).to_vec(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Flat RGBA byte view of the pixel store.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Row `y` as a pixel slice.
    pub fn row(&self, y: u32) -> &[Rgba] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Bring the surface to `width x height`.
    ///
    /// Matching dimensions keep the current store untouched. Otherwise a new
    /// transparent store is reserved first; if that fails the previous
    /// contents are left as they were.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.width == width && self.height == height {
            return Ok(());
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(LenticuleError::Allocation { width, height })?;
        let mut store: Vec<Rgba> = Vec::new();
        store
            .try_reserve_exact(len)
            .map_err(|_| LenticuleError::Allocation { width, height })?;
        store.resize(len, TRANSPARENT);

        self.pixels = store;
        self.width = width;
        self.height = height;
        Ok(())
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    /// Overwrite one pixel. Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        self.pixels[idx] = color;
    }

    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Fill an integer rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: Rgba) {
        let x0 = x.clamp(0, self.width as i64) as u32;
        let y0 = y.clamp(0, self.height as i64) as u32;
        let x1 = (x + width).clamp(0, self.width as i64) as u32;
        let y1 = (y + height).clamp(0, self.height as i64) as u32;
        for row in y0..y1 {
            let start = self.index(x0, row);
            let end = self.index(x1, row);
            if start < end {
                self.pixels[start..end].fill(color);
            }
        }
    }

    /// Composite `src`, scaled to exactly cover `dest`, into the pixels of
    /// this surface whose centres lie inside `clip`.
    ///
    /// Sampling is nearest-neighbour so channel values are copied, never
    /// interpolated. Source pixels are composited source-over; opaque pixels
    /// replace the destination outright.
    pub fn draw_scaled_clipped(&mut self, src: &Raster, dest: Rect, clip: Rect) {
        self.composite_scaled(src, dest, clip, 1.0);
    }

    /// Like [`Raster::draw_scaled_clipped`], mixing the result into the
    /// existing pixels with `weight` in `[0, 1]`.
    pub fn blend_scaled_clipped(&mut self, src: &Raster, dest: Rect, clip: Rect, weight: f64) {
        self.composite_scaled(src, dest, clip, weight.clamp(0.0, 1.0));
    }

    fn composite_scaled(&mut self, src: &Raster, dest: Rect, clip: Rect, opacity: f64) {
        if src.is_empty() || dest.is_empty() || opacity <= 0.0 {
            return;
        }
        let region = dest.intersect(&clip);
        if region.is_empty() {
            return;
        }
        let cols = Rect::covered(region.origin.x, region.max().x, self.width);
        let rows = Rect::covered(region.origin.y, region.max().y, self.height);
        if cols.is_empty() || rows.is_empty() {
            return;
        }

        let scale = DVec2::new(src.width as f64, src.height as f64) / dest.size;
        let src_x: Vec<u32> = cols
            .clone()
            .map(|c| sample_index(c as f64 + 0.5 - dest.origin.x, scale.x, src.width))
            .collect();

        for y in rows {
            let sy = sample_index(y as f64 + 0.5 - dest.origin.y, scale.y, src.height);
            let src_row = src.row(sy);
            let base = self.index(0, y);
            for (c, &sx) in cols.clone().zip(&src_x) {
                let dst = &mut self.pixels[base + c as usize];
                let top = over(src_row[sx as usize], *dst);
                *dst = if opacity >= 1.0 { top } else { mix(*dst, top, opacity) };
            }
        }
    }
}

#[inline]
fn mix(a: Rgba, b: Rgba, w: f64) -> Rgba {
    let mut out = [0u8; 4];
    for c in 0..4 {
        let (x, y) = (a[c] as f64, b[c] as f64);
        out[c] = (x + (y - x) * w).round() as u8;
    }
    out
}

#[inline]
fn sample_index(offset: f64, scale: f64, limit: u32) -> u32 {
    ((offset * scale).floor().max(0.0) as u32).min(limit - 1)
}

/// Straight-alpha source-over.
#[inline]
fn over(src: Rgba, dst: Rgba) -> Rgba {
    match src[3] {
        255 => src,
        0 => dst,
        a => {
            let sa = a as f64 / 255.0;
            let da = dst[3] as f64 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            let mut out = [0u8; 4];
            for c in 0..3 {
                let v = (src[c] as f64 * sa + dst[c] as f64 * da * (1.0 - sa)) / out_a;
                out[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            out[3] = (out_a * 255.0).round() as u8;
            out
        }
    }
}
