//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with a validated depth cap
//! - Importance sampling toward lights
//! - Gamma correction
//! - Anti-aliasing via multi-sampling, one seeded generator per pixel

use crate::error::{ConfigError, RenderResult};
use crate::{Camera, Color, HitRecord, Hittable};
use ember_math::{Interval, Ray};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Lower bound of the hit window for every traced ray; keeps a scattered ray
/// from re-hitting the surface it left.
pub const HIT_EPSILON: f32 = 0.001;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: i32,
    /// Background color when ray doesn't hit anything
    pub background: [f32; 3],
    /// Whether to use sky gradient instead of solid background
    pub use_sky_gradient: bool,
    /// Base seed; each pixel derives its own generator from it
    pub seed: u64,
    /// Worker threads. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 225,
            samples_per_pixel: 100,
            max_depth: 50,
            background: [0.0, 0.0, 0.0],
            use_sky_gradient: false,
            seed: 0,
            threads: None,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth < 0 {
            return Err(ConfigError::NegativeDepth(self.max_depth));
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::NoSamples);
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn background(&self) -> Color {
        Color::from_array(self.background)
    }
}

/// Compute the color seen by a ray.
///
/// This is the core path tracing function. It traces the ray through
/// the scene, bouncing off surfaces and accumulating color. `lights`, when
/// present, receives half of every diffuse bounce.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    lights: Option<&dyn Hittable>,
    depth: i32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth <= 0 {
        return Color::ZERO;
    }

    let mut rec = HitRecord::default();

    // Check if ray hits anything
    if !world.hit(ray, Interval::new(HIT_EPSILON, f32::INFINITY), &mut rec) {
        if config.use_sky_gradient {
            return sky_gradient(ray);
        }
        return config.background();
    }

    let emitted = rec.material.emitted(ray, &rec);

    // Absorbed: the path ends here
    let Some(srec) = rec.material.scatter(ray, &rec, lights, rng) else {
        return emitted;
    };

    // A zero or non-finite density would poison the estimate
    if !(srec.pdf_value > 0.0 && srec.pdf_value.is_finite()) {
        return emitted;
    }

    let scattering_pdf = rec.material.scattering_pdf(ray, &rec, &srec.scattered);
    let incoming = ray_color(&srec.scattered, world, lights, depth - 1, config, rng);

    emitted + scattering_pdf * srec.attenuation * incoming / srec.pdf_value
}

/// Compute sky gradient background.
fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a linear color to 8-bit RGB.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let r = (255.0 * clamp_01(linear_to_gamma(color.x))) as u8;
    let g = (255.0 * clamp_01(linear_to_gamma(color.y))) as u8;
    let b = (255.0 * clamp_01(linear_to_gamma(color.z))) as u8;
    [r, g, b]
}

/// Render a single pixel with multi-sampling.
///
/// Samples that come back NaN or infinite are counted as black rather than
/// allowed to spread into the average.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    lights: Option<&dyn Hittable>,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;
    let mut discarded = 0u32;

    for _ in 0..config.samples_per_pixel {
        // Camera.get_ray already adds random offset for anti-aliasing
        let ray = camera.get_ray(x, y, rng);
        let sample = ray_color(&ray, world, lights, config.max_depth, config, rng);
        if sample.is_finite() {
            pixel_color += sample;
        } else {
            discarded += 1;
        }
    }

    if discarded > 0 {
        log::warn!(
            "Pixel ({}, {}): discarded {} non-finite samples of {}",
            x,
            y,
            discarded,
            config.samples_per_pixel
        );
    }

    // Average the samples
    pixel_color / config.samples_per_pixel.max(1) as f32
}

/// Generator for one pixel, independent of which thread renders it.
fn pixel_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ index as u64)
}

/// Linear-color image, row-major with the top row first.
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

    /// Gamma-corrected, interleaved RGB bytes: `width * height * 3` long.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgb(*color));
        }
        bytes
    }
}

/// Render the entire scene to an image buffer.
///
/// Rows are shaded in parallel; each pixel writes only its own slot and owns
/// its own generator, so the result does not depend on the thread count.
pub fn render(
    camera: &Camera,
    world: &dyn Hittable,
    lights: Option<&dyn Hittable>,
    config: &RenderConfig,
) -> RenderResult<ImageBuffer> {
    config.validate()?;
    if camera.image_width != config.width || camera.image_height != config.height {
        return Err(ConfigError::ResolutionMismatch {
            width: config.width,
            height: config.height,
            camera_width: camera.image_width,
            camera_height: camera.image_height,
        }
        .into());
    }

    log::info!(
        "Rendering {}x{} at {} spp, max depth {}",
        config.width,
        config.height,
        config.samples_per_pixel,
        config.max_depth
    );
    let start = Instant::now();

    let mut image = ImageBuffer::new(config.width, config.height);
    let width = config.width as usize;

    let shade_rows = |pixels: &mut [Color]| {
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let mut rng = pixel_rng(config.seed, y * width + x);
                    *pixel = render_pixel(
                        camera, world, lights, x as u32, y as u32, config, &mut rng,
                    );
                }
            });
    };

    match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
            pool.install(|| shade_rows(&mut image.pixels));
        }
        None => shade_rows(&mut image.pixels),
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}
