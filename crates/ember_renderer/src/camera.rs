//! Camera for ray generation.

use crate::sampling::{gen_f32, random_in_unit_disk};
use ember_math::{Ray, Vec3};
use rand::RngCore;

/// Per-resolution viewport geometry derived by [`Camera::initialize`].
#[derive(Clone, Copy, Debug, Default)]
struct Frame {
    center: Vec3,
    /// Center of the top-left pixel
    pixel00: Vec3,
    /// Step to the next pixel right / down
    step_u: Vec3,
    step_v: Vec3,
    /// Lens disk axes, scaled by the lens radius
    lens_u: Vec3,
    lens_v: Vec3,
}

/// Pinhole or thin-lens camera producing primary rays.
#[derive(Clone, Debug)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    vfov: f32,
    /// Cone angle of rays through each pixel; 0 is a pinhole
    defocus_angle: f32,
    /// Distance to the plane of perfect focus
    focus_dist: f32,

    frame: Frame,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            frame: Frame::default(),
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Derive the viewport for the current settings. Call again after any
    /// `with_*` change, before generating rays.
    pub fn initialize(&mut self) {
        let width = self.image_width.max(1) as f32;
        let height = self.image_height.max(1) as f32;

        let viewport_height = 2.0 * (self.vfov.to_radians() / 2.0).tan() * self.focus_dist;
        let viewport_width = viewport_height * (width / height);

        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        // Image rows run top to bottom, so the vertical edge points down
        let edge_u = viewport_width * u;
        let edge_v = -viewport_height * v;
        let step_u = edge_u / width;
        let step_v = edge_v / height;

        let upper_left = self.look_from - self.focus_dist * w - 0.5 * (edge_u + edge_v);
        let lens_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();

        self.frame = Frame {
            center: self.look_from,
            pixel00: upper_left + 0.5 * (step_u + step_v),
            step_u,
            step_v,
            lens_u: u * lens_radius,
            lens_v: v * lens_radius,
        };
    }

    /// Ray through a random point of pixel (i, j). Row `j = 0` is the top of
    /// the image.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let frame = &self.frame;
        let jitter = sample_square(rng);
        let target = frame.pixel00
            + (i as f32 + jitter.x) * frame.step_u
            + (j as f32 + jitter.y) * frame.step_v;

        let origin = if self.defocus_angle <= 0.0 {
            frame.center
        } else {
            let p = random_in_unit_disk(rng);
            frame.center + p.x * frame.lens_u + p.y * frame.lens_v
        };

        Ray::new(origin, target - origin, gen_f32(rng))
    }

    pub fn center(&self) -> Vec3 {
        self.frame.center
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample a random point in the unit square [-0.5, 0.5] x [-0.5, 0.5].
fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_camera_initialize() {
        let mut camera = Camera::new()
            .with_resolution(800, 600)
            .with_position(
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .with_lens(90.0, 0.0, 1.0);

        camera.initialize();

        assert_eq!(camera.center(), Vec3::ZERO);
        // Right is +X, down the image is -Y
        assert!((camera.frame.step_u.normalize() - Vec3::X).length() < 0.001);
        assert!((camera.frame.step_v.normalize() + Vec3::Y).length() < 0.001);
        // Square pixels
        assert!((camera.frame.step_u.length() - camera.frame.step_v.length()).abs() < 1e-6);
    }

    #[test]
    fn test_camera_ray_direction() {
        let mut camera = Camera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0);

        camera.initialize();

        let mut rng = StdRng::seed_from_u64(42);

        // Center ray should point roughly towards -Z
        let ray = camera.get_ray(50, 50, &mut rng);
        assert!(ray.direction().z < 0.0);
        assert_eq!(ray.origin(), Vec3::ZERO);
    }

    #[test]
    fn test_camera_top_row_looks_up() {
        let mut camera = Camera::new()
            .with_resolution(64, 32)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(60.0, 0.0, 1.0);
        camera.initialize();

        let mut rng = StdRng::seed_from_u64(7);
        let top_left = camera.get_ray(0, 0, &mut rng).direction();
        let bottom_right = camera.get_ray(63, 31, &mut rng).direction();
        assert!(top_left.y > 0.0 && top_left.x < 0.0);
        assert!(bottom_right.y < 0.0 && bottom_right.x > 0.0);
    }

    #[test]
    fn test_defocus_origins_stay_on_lens() {
        let focus_dist = 4.0;
        let defocus_angle = 10.0_f32;
        let mut camera = Camera::new()
            .with_resolution(32, 32)
            .with_position(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, -1.0), Vec3::Y)
            .with_lens(40.0, defocus_angle, focus_dist);
        camera.initialize();

        let radius = focus_dist * (defocus_angle / 2.0).to_radians().tan();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let ray = camera.get_ray(16, 16, &mut rng);
            let offset = ray.origin() - camera.center();
            assert!(offset.length() <= radius + 1e-4);
            // Lens lies in the plane facing the view direction
            assert!(offset.z.abs() < 1e-5);
        }
    }
}
