//! Albedo textures.
//!
//! Decoding image files is left to the caller; this module takes already
//! decoded pixels (or an `image::RgbImage`) and answers nearest-pixel lookups
//! at normalized UV coordinates.

use image::RgbImage;
use lux_math::{Color, Vec2};
use thiserror::Error;

/// Errors that can occur while building a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Texture has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Expected {expected} pixels for a {width}x{height} texture, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A rectangular grid of linear RGB values.
///
/// A solid colour is a 1x1 texture.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Linear RGB, row-major, row 0 at v = 0
    pixels: Vec<Color>,
}

impl Texture {
    /// Create a texture from linear RGB pixels in row-major order.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> TextureResult<Self> {
        let expected = width as usize * height as usize;
        if expected == 0 {
            return Err(TextureError::Empty { width, height });
        }
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Color) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    /// Convert decoded 8-bit pixels, treating the bytes as linear values.
    pub fn from_image(image: &RgbImage) -> TextureResult<Self> {
        Self::convert(image, |c| c as f32 / 255.0)
    }

    /// Convert decoded 8-bit sRGB pixels to linear.
    pub fn from_srgb_image(image: &RgbImage) -> TextureResult<Self> {
        Self::convert(image, srgb_to_linear)
    }

    fn convert(image: &RgbImage, channel: impl Fn(u8) -> f32) -> TextureResult<Self> {
        let (width, height) = image.dimensions();
        let pixels = image
            .pixels()
            .map(|p| Color::new(channel(p[0]), channel(p[1]), channel(p[2])))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Nearest-pixel lookup. UV coordinates are clamped to `[0, 1]`.
    pub fn sample(&self, uv: Vec2) -> Color {
        if let [only] = self.pixels.as_slice() {
            return *only;
        }
        let uv = uv.clamp(Vec2::ZERO, Vec2::ONE);
        let x = (uv.x * (self.width - 1) as f32).round() as u32;
        let y = (uv.y * (self.height - 1) as f32).round() as u32;
        self.get_pixel(x, y)
    }

    /// Get pixel at integer coordinates (clamped to the grid).
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        Texture::new(
            2,
            2,
            vec![
                Color::new(1.0, 0.0, 0.0),
                Color::new(0.0, 1.0, 0.0),
                Color::new(0.0, 0.0, 1.0),
                Color::new(1.0, 1.0, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Color::new(1.0, 0.5, 0.0));
        assert_eq!(tex.sample(Vec2::new(0.5, 0.5)), Color::new(1.0, 0.5, 0.0));
        assert_eq!(tex.sample(Vec2::new(-3.0, 7.0)), Color::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_nearest_lookup() {
        let tex = checker();
        assert_eq!(tex.sample(Vec2::new(0.0, 0.0)), Color::new(1.0, 0.0, 0.0));
        assert_eq!(tex.sample(Vec2::new(0.9, 0.1)), Color::new(0.0, 1.0, 0.0));
        assert_eq!(tex.sample(Vec2::new(0.2, 0.8)), Color::new(0.0, 0.0, 1.0));
        assert_eq!(tex.sample(Vec2::new(1.0, 1.0)), Color::ONE);
    }

    #[test]
    fn test_uv_outside_unit_square_is_clamped() {
        let tex = checker();
        assert_eq!(tex.sample(Vec2::new(5.0, -1.0)), Color::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_size_mismatch() {
        let err = Texture::new(2, 2, vec![Color::ZERO; 3]).unwrap_err();
        assert!(matches!(err, TextureError::SizeMismatch { expected: 4, actual: 3, .. }));
        assert!(matches!(
            Texture::new(0, 4, Vec::new()),
            Err(TextureError::Empty { .. })
        ));
    }

    #[test]
    fn test_from_image_is_linear_scale() {
        let image = RgbImage::from_raw(1, 2, vec![255, 0, 51, 0, 102, 255]).unwrap();
        let tex = Texture::from_image(&image).unwrap();
        assert_eq!(tex.get_pixel(0, 0), Color::new(1.0, 0.0, 0.2));
        assert!((tex.get_pixel(0, 1) - Color::new(0.0, 0.4, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_srgb_to_linear() {
        // Black stays black
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);

        // White stays white
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
