// Transform utilities for Mat4
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and
// inverse(); instance wrappers also need world-space boxes.

use crate::Aabb;
use glam::Mat4;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Re-encloses all 8 transformed corners, so the result is conservative
    /// for any transform that breaks axis alignment.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let corners = aabb.corners();

        let first = self.transform_point3(corners[0]);
        let (result_min, result_max) = corners[1..]
            .iter()
            .map(|&corner| self.transform_point3(corner))
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));

        Aabb::from_points(result_min, result_max)
    }
}
