//! Accumulation image and its encoding to 8-bit PNG.

use crate::{encode_srgb, tonemap_reinhard, Color, RenderError, RenderResult};
use std::path::Path;

/// Linear radiance image, row-major, row 0 at the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// Tonemap, sRGB-encode and flip to top-down RGBA8 rows.
    pub fn to_rgba(&self) -> Vec<u8> {
        let width = self.width as usize;
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for row in self.pixels.chunks_exact(width.max(1)).rev() {
            for &color in row {
                let [r, g, b] = encode_srgb(tonemap_reinhard(color));
                bytes.extend_from_slice(&[r, g, b, 255]);
            }
        }
        bytes
    }

    /// Encode the image as a PNG file.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }

        let rgba = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba()).ok_or(
            RenderError::EmptyImage {
                width: self.width,
                height: self.height,
            },
        )?;
        rgba.save(path)?;

        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}
