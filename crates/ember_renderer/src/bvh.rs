//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over shared primitive handles. Built once per render and
//! read-only afterwards, so any number of render threads can traverse it.

use crate::error::{BvhError, BvhResult};
use crate::{HitRecord, Hittable, HittableRef};
use ember_math::{Aabb, Interval, Ray};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 2;

/// BVH node - either a branch with two children or a leaf with primitives.
///
/// Using an enum keeps traversal a plain `match` on the node kind.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with one or two primitives, ordered along the split axis.
    Leaf {
        objects: Vec<HittableRef>,
        bbox: Aabb,
    },
    /// Built from no primitives. Never hit.
    Empty,
}

impl BvhNode {
    /// Create a BVH from a list of hittable objects.
    ///
    /// Every object must report a bounding box over `[time0, time1]`; the
    /// first one that does not fails the build with its index.
    pub fn new(objects: Vec<HittableRef>, time0: f32, time1: f32) -> BvhResult<Self> {
        if objects.is_empty() {
            log::debug!("BVH built over an empty scene");
            return Ok(BvhNode::Empty);
        }

        let mut entries = Vec::with_capacity(objects.len());
        for (index, object) in objects.into_iter().enumerate() {
            let bbox = object
                .bounding_box(time0, time1)
                .ok_or(BvhError::Unbounded { index })?;
            entries.push((object, bbox));
        }

        let count = entries.len();
        let root = Self::build(entries);
        log::info!(
            "BVH built: {} primitives, {} nodes, depth {}",
            count,
            root.node_count(),
            root.depth()
        );
        Ok(root)
    }

    /// Recursive BVH construction.
    ///
    /// Median split: sort by centroid on the axis where the centroids spread
    /// the most, split in half, recurse. The sort is stable so identical input
    /// builds an identical tree.
    fn build(mut entries: Vec<(HittableRef, Aabb)>) -> Self {
        let bounds = entries
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, b)| Aabb::surrounding(&acc, b));

        let centroid_bounds = entries.iter().fold(Aabb::EMPTY, |acc, (_, b)| {
            let c = b.centroid();
            Aabb::surrounding(&acc, &Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        entries.sort_by(|(_, a), (_, b)| a.centroid()[axis].total_cmp(&b.centroid()[axis]));

        if entries.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                objects: entries.into_iter().map(|(object, _)| object).collect(),
                bbox: bounds,
            };
        }

        let mid = entries.len() / 2;
        let right_entries = entries.split_off(mid);

        let left = Self::build(entries);
        let right = Self::build(right_entries);

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox: bounds,
        }
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        match self {
            BvhNode::Empty => false,

            BvhNode::Leaf { objects, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let mut hit_anything = false;
                let mut closest = ray_t.max;

                for obj in objects {
                    let interval = Interval::new(ray_t.min, closest);
                    if obj.hit(ray, interval, rec) {
                        hit_anything = true;
                        closest = rec.t;
                    }
                }
                hit_anything
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let hit_left = left.hit(ray, ray_t, rec);

                // Only check right strictly before the closest hit, so an
                // equal-t hit in the right subtree never replaces the left one
                let right_max = if hit_left { rec.t } else { ray_t.max };
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max), rec);

                hit_left || hit_right
            }
        }
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
        match self {
            BvhNode::Empty => Some(Aabb::EMPTY),
            BvhNode::Leaf { bbox, .. } => Some(*bbox),
            BvhNode::Branch { bbox, .. } => Some(*bbox),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{gen_range, random_unit_vector};
    use crate::{DiffuseLight, HittableList, Lambertian, Material, Sphere};
    use ember_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    type Color = Vec3;

    struct Unbounded;

    impl Hittable for Unbounded {
        fn hit<'a>(&'a self, _ray: &Ray, _ray_t: Interval, _rec: &mut HitRecord<'a>) -> bool {
            false
        }

        fn bounding_box(&self, _time0: f32, _time1: f32) -> Option<Aabb> {
            None
        }
    }

    fn grey_sphere(center: Vec3, radius: f32) -> HittableRef {
        Arc::new(Sphere::new(center, radius, Lambertian::new(Color::new(0.5, 0.5, 0.5))))
    }

    fn emission(material: &Material) -> Color {
        material.emitted(&Ray::default(), &HitRecord::default())
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = BvhNode::new(vec![], 0.0, 1.0).unwrap();
        assert!(matches!(bvh, BvhNode::Empty));

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(!bvh.hit(&ray, Interval::UNIVERSE, &mut rec));
        assert_eq!(bvh.node_count(), 0);
    }

    #[test]
    fn test_bvh_single_sphere() {
        let bvh =
            BvhNode::new(vec![grey_sphere(Vec3::new(0.0, 0.0, -1.0), 0.5)], 0.0, 1.0).unwrap();

        // Should create a leaf
        assert!(matches!(bvh, BvhNode::Leaf { .. }));

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_two_spheres_share_a_leaf() {
        let bvh = BvhNode::new(
            vec![
                grey_sphere(Vec3::new(3.0, 0.0, -5.0), 0.5),
                grey_sphere(Vec3::new(-3.0, 0.0, -5.0), 0.5),
            ],
            0.0,
            1.0,
        )
        .unwrap();

        match &bvh {
            BvhNode::Leaf { objects, .. } => {
                assert_eq!(objects.len(), 2);
                // Ordered along x, the axis of greatest spread
                let first = objects[0].bounding_box(0.0, 1.0).unwrap().centroid();
                assert!(first.x < 0.0);
            }
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let spheres: Vec<HittableRef> = (0..10)
            .map(|i| grey_sphere(Vec3::new(i as f32, 0.0, -5.0), 0.5))
            .collect();

        let bvh = BvhNode::new(spheres, 0.0, 1.0).unwrap();
        assert!(matches!(bvh, BvhNode::Branch { .. }));
        assert!(bvh.depth() >= 3);

        // Test ray that hits sphere at x=5
        let ray = Ray::new_simple(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));

        // Hit point should be near z = -4.5 (sphere at z=-5, radius 0.5)
        assert!((rec.p.z - (-4.5)).abs() < 0.01);
    }

    #[test]
    fn test_bvh_rejects_unbounded_primitive() {
        let objects: Vec<HittableRef> = vec![
            grey_sphere(Vec3::ZERO, 1.0),
            grey_sphere(Vec3::X, 1.0),
            Arc::new(Unbounded),
        ];
        let result = BvhNode::new(objects, 0.0, 1.0);
        assert_eq!(result.err(), Some(BvhError::Unbounded { index: 2 }));
    }

    #[test]
    fn test_bvh_box_encloses_children() {
        let bvh = BvhNode::new(
            vec![
                grey_sphere(Vec3::new(-4.0, 1.0, 0.0), 1.0),
                grey_sphere(Vec3::new(2.0, -3.0, 5.0), 0.5),
                grey_sphere(Vec3::new(0.0, 0.0, -2.0), 2.0),
            ],
            0.0,
            1.0,
        )
        .unwrap();

        let bbox = bvh.bounding_box(0.0, 1.0).unwrap();
        assert_eq!(bbox.x.min, -5.0);
        assert_eq!(bbox.x.max, 2.5);
        assert_eq!(bbox.y.min, -3.5);
        assert_eq!(bbox.z.min, -4.0);
        assert_eq!(bbox.z.max, 5.5);
    }

    #[test]
    fn test_bvh_tie_goes_to_first_primitive() {
        // Identical spheres, distinguishable only by their emission
        let colors = [
            Color::new(1.0, 0.0, 0.0),
            Color::new(0.0, 1.0, 0.0),
            Color::new(0.0, 0.0, 1.0),
            Color::new(1.0, 1.0, 0.0),
            Color::new(0.0, 1.0, 1.0),
        ];

        for n in [2, 5] {
            let objects: Vec<HittableRef> = colors[..n]
                .iter()
                .map(|&c| {
                    Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, DiffuseLight::new(c)))
                        as HittableRef
                })
                .collect();
            let bvh = BvhNode::new(objects, 0.0, 1.0).unwrap();

            let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
            let mut rec = HitRecord::default();
            assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
            assert_eq!(emission(rec.material), colors[0], "n = {n}");
        }
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(1234);

        for count in [1, 2, 3, 7, 64, 257, 500] {
            let objects: Vec<HittableRef> = (0..count)
                .map(|_| {
                    let center = Vec3::new(
                        gen_range(&mut rng, -20.0, 20.0),
                        gen_range(&mut rng, -20.0, 20.0),
                        gen_range(&mut rng, -20.0, 20.0),
                    );
                    grey_sphere(center, gen_range(&mut rng, 0.1, 2.0))
                })
                .collect();

            let list = HittableList::from_objects(objects.clone());
            let bvh = BvhNode::new(objects, 0.0, 1.0).unwrap();

            for _ in 0..1000 {
                let origin = random_unit_vector(&mut rng) * gen_range(&mut rng, 0.0, 40.0);
                let ray = Ray::new_simple(origin, random_unit_vector(&mut rng));
                let window = Interval::new(0.001, f32::INFINITY);

                let mut expected = HitRecord::default();
                let mut actual = HitRecord::default();
                let hit_linear = list.hit(&ray, window, &mut expected);
                let hit_bvh = bvh.hit(&ray, window, &mut actual);

                assert_eq!(hit_linear, hit_bvh, "count = {count}, ray = {:?}", ray);
                if hit_linear {
                    assert!(
                        (expected.t - actual.t).abs() < 1e-4,
                        "count = {count}: linear t = {}, bvh t = {}",
                        expected.t,
                        actual.t
                    );
                }
            }
        }
    }
}
