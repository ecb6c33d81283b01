//! Pixel buffers and the premultiplied staging surface.
//!
//! [`PixelBuffer`] is the API-boundary format: straight-alpha RGBA8,
//! row-major, stride `width * 4`. [`Surface`] is the premultiplied RGBA8
//! target that software contexts draw into.

use crate::error::{RenderError, RenderResult};
use crate::types::{Color, IntRect};

/// Largest accepted surface edge, in pixels.
pub const MAX_SURFACE_DIMENSION: u32 = 16384;

/// Straight-alpha RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap existing bytes, checking the length.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> RenderResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&rgba);
        }
    }
}

/// A premultiplied RGBA8 drawing target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 || width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> IntRect {
        IntRect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Premultiplied bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reallocate, discarding content.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    pub fn clear(&mut self, color: Color) {
        let px = color.to_premul_rgba8();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    /// Premultiplied color at a pixel.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let i = self.offset(x, y)?;
        let c = |v: u8| v as f32 / 255.0;
        Some(Color::new(
            c(self.data[i]),
            c(self.data[i + 1]),
            c(self.data[i + 2]),
            c(self.data[i + 3]),
        ))
    }

    /// Source-over composite of a premultiplied color scaled by `coverage`.
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        let Some(i) = self.offset(x, y) else {
            return;
        };
        let src = color.scale_alpha(coverage.clamp(0.0, 1.0));
        if src.a <= 0.0 {
            return;
        }
        let inv = 1.0 - src.a;
        let mix = |s: f32, d: u8| ((s + d as f32 / 255.0 * inv).clamp(0.0, 1.0) * 255.0).round() as u8;
        self.data[i] = mix(src.r, self.data[i]);
        self.data[i + 1] = mix(src.g, self.data[i + 1]);
        self.data[i + 2] = mix(src.b, self.data[i + 2]);
        self.data[i + 3] = mix(src.a, self.data[i + 3]);
    }

    /// Read a region as straight-alpha pixels, clamped to the surface.
    pub fn read_region(&self, region: IntRect) -> RenderResult<(IntRect, PixelBuffer)> {
        let clamped = region
            .intersect(&self.bounds())
            .ok_or(RenderError::RegionOutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            })?;
        let mut out = PixelBuffer::new(clamped.width as u32, clamped.height as u32);
        for row in 0..clamped.height {
            for col in 0..clamped.width {
                if let Some(c) = self.pixel(clamped.x + col, clamped.y + row) {
                    out.set_pixel(col as u32, row as u32, c.to_rgba8());
                }
            }
        }
        Ok((clamped, out))
    }

    /// Overwrite one pixel with a straight-alpha value.
    pub fn put(&mut self, x: i32, y: i32, [r, g, b, a]: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            let premul = Color::from_rgba8(r, g, b, a).to_premul_rgba8();
            self.data[i..i + 4].copy_from_slice(&premul);
        }
    }

    /// Replace pixels at `(x, y)` with straight-alpha data; off-surface parts are skipped.
    pub fn write_region(&mut self, x: i32, y: i32, pixels: &PixelBuffer) {
        for row in 0..pixels.height() {
            for col in 0..pixels.width() {
                if let Some(rgba) = pixels.pixel(col, row) {
                    self.put(x + col as i32, y + row as i32, rgba);
                }
            }
        }
    }

    /// Copy another surface of the same size.
    pub fn copy_from(&mut self, other: &Surface) {
        if self.width == other.width && self.height == other.height {
            self.data.copy_from_slice(&other.data);
        } else {
            self.clone_from(other);
        }
    }

    /// Whole surface as straight-alpha pixels.
    pub fn to_pixel_buffer(&self) -> PixelBuffer {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            let c = Color::new(
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
                px[3] as f32 / 255.0,
            );
            data.extend_from_slice(&c.to_rgba8());
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_checked() {
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            PixelBuffer::from_rgba8(2, 2, vec![0; 15]),
            Err(RenderError::BufferSizeMismatch { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_surface_dimensions_checked() {
        assert!(Surface::new(0, 10).is_err());
        assert!(Surface::new(MAX_SURFACE_DIMENSION + 1, 1).is_err());
    }

    #[test]
    fn test_blend_over() {
        let mut s = Surface::new(1, 1).unwrap();
        s.clear(Color::WHITE);
        s.blend(0, 0, Color::from_rgba8(0, 0, 0, 128), 1.0);
        let c = s.pixel(0, 0).unwrap();
        assert!((c.r - 0.5).abs() < 0.01);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_region_round_trip() {
        let mut s = Surface::new(4, 4).unwrap();
        s.clear(Color::from_rgba8(200, 100, 50, 255));
        let (rect, opaque) = s.read_region(IntRect::new(2, 2, 10, 10)).unwrap();
        assert_eq!(rect, IntRect::new(2, 2, 2, 2));
        assert_eq!(opaque.pixel(0, 0), Some([200, 100, 50, 255]));

        // Translucent pixels survive a save/restore cycle unchanged.
        s.clear(Color::from_rgba8(200, 100, 50, 128));
        let (rect, saved) = s.read_region(rect).unwrap();
        s.clear(Color::BLACK);
        s.write_region(rect.x, rect.y, &saved);
        let (_, again) = s.read_region(rect).unwrap();
        assert_eq!(again, saved);
    }

    #[test]
    fn test_region_outside_surface() {
        let s = Surface::new(4, 4).unwrap();
        assert!(matches!(
            s.read_region(IntRect::new(10, 10, 2, 2)),
            Err(RenderError::RegionOutOfBounds { .. })
        ));
    }
}
