//! Surface color lookups for materials.
//!
//! Image textures are decoded once into linear floats and shared between
//! materials through an `Arc`.

use crate::error::{TextureError, TextureResult};
use ember_math::{Color, Vec3};
use std::path::Path;
use std::sync::Arc;

/// Color returned by an image texture that has no pixel data, so missing
/// images show up clearly in renders.
const MISSING_TEXTURE: Color = Color::new(0.0, 1.0, 1.0);

/// Color source for a material, evaluated per hit.
#[derive(Clone, Debug)]
pub enum Texture {
    /// Constant color everywhere.
    Solid(Color),
    /// 3D checkerboard alternating two colors with cells of size `scale`.
    Checker { scale: f32, even: Color, odd: Color },
    /// Image looked up by surface UV.
    Image(Arc<ImageTexture>),
}

impl Texture {
    /// Evaluate the texture at surface coordinates (u, v) and world point `p`.
    pub fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        match self {
            Texture::Solid(color) => *color,
            Texture::Checker { scale, even, odd } => {
                let inv = 1.0 / scale;
                let cell = (inv * p.x).floor() as i64
                    + (inv * p.y).floor() as i64
                    + (inv * p.z).floor() as i64;
                if cell.rem_euclid(2) == 0 {
                    *even
                } else {
                    *odd
                }
            }
            Texture::Image(image) => image.value(u, v),
        }
    }
}

impl From<Color> for Texture {
    fn from(color: Color) -> Self {
        Texture::Solid(color)
    }
}

impl From<ImageTexture> for Texture {
    fn from(image: ImageTexture) -> Self {
        Texture::Image(Arc::new(image))
    }
}

/// A decoded RGB image stored as linear floats, row-major, top row first.
#[derive(Clone, Debug, Default)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl ImageTexture {
    /// Build from a tightly packed 8-bit sRGB buffer (`width * height * 3`).
    pub fn from_rgb8(width: u32, height: u32, data: &[u8]) -> TextureResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(TextureError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        let pixels = data
            .chunks_exact(3)
            .map(|p| {
                Color::new(
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                )
            })
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Load an image file with the `image` crate.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        let texture = Self::from_rgb8(width, height, rgb.as_raw())?;
        log::debug!(
            "Loaded texture: {} ({}x{})",
            path.display(),
            width,
            height
        );
        Ok(texture)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest-pixel lookup. UVs are clamped to [0, 1]; v = 1 is the top row.
    pub fn value(&self, u: f32, v: f32) -> Color {
        if self.pixels.is_empty() {
            return MISSING_TEXTURE;
        }

        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        let i = ((u * self.width as f32) as u32).min(self.width - 1);
        let j = ((v * self.height as f32) as u32).min(self.height - 1);

        self.pixels[(j * self.width + i) as usize]
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

    fn two_by_two() -> ImageTexture {
        // top-left red, top-right green, bottom-left blue, bottom-right white
        let data = [
            255, 0, 0, 0, 255, 0, //
            0, 0, 255, 255, 255, 255,
        ];
        ImageTexture::from_rgb8(2, 2, &data).unwrap()
    }

    #[test]
    fn test_image_lookup_flips_v() {
        let tex = two_by_two();
        assert_eq!(tex.value(0.0, 1.0), Color::new(1.0, 0.0, 0.0));
        assert_eq!(tex.value(1.0, 1.0), Color::new(0.0, 1.0, 0.0));
        assert_eq!(tex.value(0.0, 0.0), Color::new(0.0, 0.0, 1.0));
        assert_eq!(tex.value(0.9, 0.1), Color::ONE);
    }

    #[test]
    fn test_image_lookup_clamps_uv() {
        let tex = two_by_two();
        assert_eq!(tex.value(-3.0, 7.0), tex.value(0.0, 1.0));
        assert_eq!(tex.value(5.0, -2.0), tex.value(1.0, 0.0));
    }

    #[test]
    fn test_missing_image_is_cyan() {
        assert_eq!(ImageTexture::default().value(0.5, 0.5), MISSING_TEXTURE);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let err = ImageTexture::from_rgb8(2, 2, &[0; 5]).unwrap_err();
        assert!(matches!(err, TextureError::BufferSize { expected: 12, actual: 5, .. }));
    }

    #[test]
    fn test_checker_alternates() {
        let checker = Texture::Checker {
            scale: 1.0,
            even: Color::ONE,
            odd: Color::ZERO,
        };
        assert_eq!(checker.value(0.0, 0.0, Vec3::new(0.5, 0.5, 0.5)), Color::ONE);
        assert_eq!(checker.value(0.0, 0.0, Vec3::new(1.5, 0.5, 0.5)), Color::ZERO);
        assert_eq!(checker.value(0.0, 0.0, Vec3::new(-0.5, 0.5, 0.5)), Color::ZERO);
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);
        let mid = srgb_to_linear(128);
        assert!(mid > 0.1 && mid < 0.5);
    }
}
