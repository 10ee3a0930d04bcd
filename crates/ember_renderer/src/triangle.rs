//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::sampling::gen_f32;
use crate::{HitRecord, Hittable, Material};
use ember_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// A triangle primitive.
pub struct Triangle {
    v0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    area: f32,
    material: Material,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices. Winding order decides
    /// the outward normal (counter-clockwise faces the viewer).
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: impl Into<Material>) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let cross = edge1.cross(edge2);

        // Flat triangles get padded by Aabb::from_points
        let bbox = Aabb::from_points(v0.min(v1).min(v2), v0.max(v1).max(v2));

        Self {
            v0,
            edge1,
            edge2,
            normal: cross.normalize_or_zero(),
            area: 0.5 * cross.length(),
            material: material.into(),
            bbox,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn area(&self) -> f32 {
        self.area
    }
}

impl Hittable for Triangle {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let h = ray.direction().cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle (or the triangle is degenerate)
        if a.abs() < 1e-8 {
            return false;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        let t = f * self.edge2.dot(q);
        if !ray_t.surrounds(t) {
            return false;
        }

        rec.t = t;
        rec.p = ray.at(t);
        rec.set_face_normal(ray, self.normal);
        rec.u = u;
        rec.v = v;
        rec.material = &self.material;

        true
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        Some(self.bbox)
    }

    /// Area-light density converted to solid angle: distance² / (cos · area).
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let mut rec = HitRecord::default();
        if !self.hit(
            &Ray::new_simple(origin, direction),
            Interval::new(0.001, f32::INFINITY),
            &mut rec,
        ) {
            return 0.0;
        }

        let distance_squared = rec.t * rec.t * direction.length_squared();
        let cosine = (direction.dot(rec.normal) / direction.length()).abs();
        if cosine < 1e-6 || self.area <= 0.0 {
            return 0.0;
        }
        distance_squared / (cosine * self.area)
    }

    /// Uniform point on the triangle, as a direction from `origin`.
    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let mut r1 = gen_f32(rng);
        let mut r2 = gen_f32(rng);
        if r1 + r2 > 1.0 {
            r1 = 1.0 - r1;
            r2 = 1.0 - r2;
        }
        self.v0 + r1 * self.edge1 + r2 * self.edge2 - origin
    }
}
