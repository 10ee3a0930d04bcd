//! Ember Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer for physically-based rendering: a BVH over
//! shared primitives, importance-sampled diffuse bounces toward the lights,
//! and a row-parallel renderer producing a flat RGB8 buffer.

mod bvh;
mod camera;
pub mod error;
mod hittable;
mod instance;
mod material;
pub mod pdf;
mod renderer;
pub mod sampling;
mod scene;
mod sphere;
mod texture;
mod triangle;

pub use bvh::BvhNode;
pub use camera::Camera;
pub use error::{BvhError, ConfigError, RenderError, RenderResult, TextureError};
pub use hittable::{HitRecord, Hittable, HittableList, HittableRef};
pub use instance::{Rotate, Translate};
pub use material::{
    Dielectric, DiffuseLight, Lambertian, Material, Metal, ScatterRecord, SPECULAR_PDF,
};
pub use pdf::{CosinePdf, HittablePdf, MixturePdf, Pdf};
pub use renderer::{
    color_to_rgb, linear_to_gamma, ray_color, render, render_pixel, ImageBuffer, RenderConfig,
    HIT_EPSILON,
};
pub use scene::Scene;
pub use sphere::Sphere;
pub use texture::{ImageTexture, Texture};
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from ember_math
pub use ember_math::{Aabb, Color, Interval, Ray, Vec3};
