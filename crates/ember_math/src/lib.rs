//! Ember math - vector types and geometric building blocks shared by the
//! path tracing core.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod onb;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::Mat4Ext;

/// Linear RGB radiance triple.
pub type Color = Vec3;
