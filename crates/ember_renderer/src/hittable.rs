//! Hittable trait and HitRecord for ray-object intersection.

use crate::sampling::gen_f32;
use crate::{DiffuseLight, Material};
use ember_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Material used by `HitRecord::default()`: emits black and never scatters.
static DUMMY_MATERIAL: Material = Material::DiffuseLight(DiffuseLight::new(Vec3::ZERO));

/// Shared, read-only handle to a primitive.
///
/// The scene and the BVH both hold these; neither owns the primitive's
/// lifetime exclusively and neither mutates it.
pub type HittableRef = Arc<dyn Hittable>;

/// Record of a ray-object intersection.
///
/// Overwritten by every successful hit query, so callers copy what they need
/// before issuing another query.
#[derive(Clone)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a Material,
    /// UV texture coordinates
    pub u: f32,
    pub v: f32,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> Default for HitRecord<'a> {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            material: &DUMMY_MATERIAL,
            u: 0.0,
            v: 0.0,
            t: f32::INFINITY,
            front_face: false,
        }
    }
}

impl<'a> HitRecord<'a> {
    /// Set the face normal based on ray direction and outward normal.
    ///
    /// `outward_normal` must be unit length.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        // If the ray and normal point in the same direction, we're inside
        self.front_face = ray.direction().dot(outward_normal) < 0.0;

        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object strictly inside `ray_t`.
    ///
    /// Returns true if hit, and fills in the hit record. The record is left
    /// untouched on a miss.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool;

    /// Bounding box over the time window `[time0, time1]`.
    ///
    /// `None` means the object is unbounded; the BVH refuses to build over it.
    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb>;

    /// Density of sampling `direction` from `origin` toward this object
    /// with [`Hittable::random`]. Zero for objects that cannot be sampled.
    fn pdf_value(&self, _origin: Vec3, _direction: Vec3) -> f32 {
        0.0
    }

    /// Random direction from `origin` toward this object.
    fn random(&self, _origin: Vec3, _rng: &mut dyn RngCore) -> Vec3 {
        Vec3::X
    }
}

/// A list of hittable objects, scanned linearly.
#[derive(Clone, Default)]
pub struct HittableList {
    objects: Vec<HittableRef>,
}

impl HittableList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: Vec<HittableRef>) -> Self {
        Self { objects }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: HittableRef) {
        self.objects.push(object);
    }

    /// Remove the object at `index`. Returns false (and does nothing) when
    /// the index is out of range.
    pub fn remove(&mut self, index: usize) -> bool {
        if index < self.objects.len() {
            self.objects.remove(index);
            true
        } else {
            false
        }
    }

    pub fn objects(&self) -> &[HittableRef] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Hittable for HittableList {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let mut hit_anything = false;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            let interval = Interval::new(ray_t.min, closest_so_far);
            if object.hit(ray, interval, rec) {
                hit_anything = true;
                closest_so_far = rec.t;
            }
        }

        hit_anything
    }

    /// `None` if any member is unbounded; an empty list has an empty box.
    fn bounding_box(&self, time0: f32, time1: f32) -> Option<Aabb> {
        self.objects.iter().try_fold(Aabb::EMPTY, |acc, object| {
            object
                .bounding_box(time0, time1)
                .map(|b| Aabb::surrounding(&acc, &b))
        })
    }

    /// Average of the members' densities: each is picked with equal odds by
    /// [`HittableList::random`].
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f32;
        self.objects
            .iter()
            .map(|o| weight * o.pdf_value(origin, direction))
            .sum()
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::X;
        }
        let n = self.objects.len();
        let index = ((gen_f32(rng) * n as f32) as usize).min(n - 1);
        self.objects[index].random(origin, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Sphere};

    fn sphere_at(z: f32) -> HittableRef {
        Arc::new(Sphere::new(
            Vec3::new(0.0, 0.0, z),
            0.5,
            Lambertian::new(Vec3::splat(0.5)),
        ))
    }

    #[test]
    fn test_list_returns_nearest() {
        let list =
            HittableList::from_objects(vec![sphere_at(-5.0), sphere_at(-2.0), sphere_at(-8.0)]);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();

        assert!(list.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_list_miss_leaves_record() {
        let list = HittableList::from_objects(vec![sphere_at(-5.0)]);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Y);
        let mut rec = HitRecord::default();

        assert!(!list.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert_eq!(rec.t, f32::INFINITY);
    }

    #[test]
    fn test_list_remove_out_of_range_is_noop() {
        let mut list = HittableList::from_objects(vec![sphere_at(-1.0), sphere_at(-2.0)]);
        assert!(!list.remove(2));
        assert_eq!(list.len(), 2);
        assert!(list.remove(0));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_list_bounding_box() {
        let list = HittableList::from_objects(vec![sphere_at(-1.0), sphere_at(-4.0)]);
        let bbox = list.bounding_box(0.0, 1.0).unwrap();
        assert_eq!(bbox.z.min, -4.5);
        assert_eq!(bbox.z.max, -0.5);

        assert_eq!(HittableList::new().bounding_box(0.0, 1.0), Some(Aabb::EMPTY));
    }

    #[test]
    fn test_face_normal_flips_inside() {
        let mut rec = HitRecord::default();
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::X);
        rec.set_face_normal(&ray, Vec3::X);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, -Vec3::X);

        rec.set_face_normal(&ray, -Vec3::X);
        assert!(rec.front_face);
        assert_eq!(rec.normal, -Vec3::X);
    }
}
