//! Instance wrappers that place a child object in the world.
//!
//! Rather than transforming geometry, the incoming ray is moved into the
//! child's local space, the child is queried there, and the hit is moved back
//! out. The ray direction is not renormalized, so `t` means the same thing on
//! both sides and nearest-hit comparisons across instances stay valid.

use crate::{HitRecord, Hittable, HittableRef};
use ember_math::{Aabb, EulerRot, Interval, Mat4, Mat4Ext, Quat, Ray, Vec3};
use rand::RngCore;

/// A child object moved by a constant offset.
pub struct Translate {
    object: HittableRef,
    offset: Vec3,
}

impl Translate {
    pub fn new(object: HittableRef, offset: Vec3) -> Self {
        Self { object, offset }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }
}

impl Hittable for Translate {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let local_ray = Ray::new(ray.origin() - self.offset, ray.direction(), ray.time());
        if !self.object.hit(&local_ray, ray_t, rec) {
            return false;
        }

        // Translation leaves normals and facing untouched
        rec.p += self.offset;
        true
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        self.object
            .bounding_box(time0, time1)
            .map(|bbox| bbox.translate(self.offset))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        self.object.pdf_value(origin - self.offset, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(origin - self.offset, rng)
    }
}

/// A child object rotated about the origin.
pub struct Rotate {
    object: HittableRef,
    /// Local-to-world
    transform: Mat4,
    /// World-to-local
    inv_transform: Mat4,
}

impl Rotate {
    /// Rotate by Euler angles in degrees. The composition is `Rx * Ry * Rz`,
    /// so a point is turned about Z first, then Y, then X.
    pub fn new(object: HittableRef, degrees: Vec3) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        );
        Self::from_quat(object, rotation)
    }

    /// Rotate about the Y axis only.
    pub fn y(object: HittableRef, degrees: f32) -> Self {
        Self::from_quat(object, Quat::from_rotation_y(degrees.to_radians()))
    }

    pub fn from_quat(object: HittableRef, rotation: Quat) -> Self {
        let transform = Mat4::from_quat(rotation.normalize());
        log::debug!("Rotate instance: {:?}", rotation);
        Self {
            object,
            transform,
            inv_transform: transform.inverse(),
        }
    }
}

impl Hittable for Rotate {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let local_ray = Ray::new(
            self.inv_transform.transform_point3(ray.origin()),
            self.inv_transform.transform_vector3(ray.direction()),
            ray.time(),
        );
        if !self.object.hit(&local_ray, ray_t, rec) {
            return false;
        }

        // Rotation preserves dot products, so the normal still faces the ray
        // and stays unit length
        rec.p = self.transform.transform_point3(rec.p);
        rec.normal = self.transform.transform_vector3(rec.normal);
        true
    }

    /// Child box with all 8 corners rotated and re-enclosed; conservative.
    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        self.object
            .bounding_box(time0, time1)
            .map(|bbox| self.transform.transform_aabb(&bbox))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        self.object.pdf_value(
            self.inv_transform.transform_point3(origin),
            self.inv_transform.transform_vector3(direction),
        )
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let local = self
            .object
            .random(self.inv_transform.transform_point3(origin), rng);
        self.transform.transform_vector3(local)
    }
}
