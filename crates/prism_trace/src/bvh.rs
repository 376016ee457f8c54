//! Bounding volume hierarchy over a prototype mesh.
//!
//! Median-split construction: sort by centroid on the longest axis of the
//! centroid bounds, split in half, recurse. An enum avoids dynamic dispatch
//! during traversal.

use prism_math::{Aabb, Interval, Ray};

use crate::triangle::Triangle;
use crate::Hit;

/// Maximum triangles per leaf before splitting.
const LEAF_MAX_SIZE: usize = 4;

pub enum Bvh {
    Branch {
        left: Box<Bvh>,
        right: Box<Bvh>,
        bbox: Aabb,
    },
    Leaf {
        triangles: Vec<Triangle>,
        bbox: Aabb,
    },
    Empty,
}

impl Bvh {
    pub fn build(triangles: Vec<Triangle>) -> Self {
        if triangles.is_empty() {
            return Bvh::Empty;
        }
        Self::split(triangles)
    }

    fn split(mut triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .map(Triangle::bounding_box)
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b));

        if triangles.len() <= LEAF_MAX_SIZE {
            return Bvh::Leaf {
                triangles,
                bbox: bounds,
            };
        }

        // Split axis from the spread of centroids, not of the boxes
        let centroid_bounds = triangles.iter().fold(Aabb::EMPTY, |acc, tri| {
            let c = tri.bounding_box().centroid();
            Aabb::surrounding(&acc, &Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        triangles.sort_unstable_by(|a, b| {
            let a_val = a.bounding_box().centroid()[axis];
            let b_val = b.bounding_box().centroid()[axis];
            a_val.partial_cmp(&b_val).unwrap_or(std::cmp::Ordering::Equal)
        });

        let right = triangles.split_off(triangles.len() / 2);
        Bvh::Branch {
            left: Box::new(Self::split(triangles)),
            right: Box::new(Self::split(right)),
            bbox: bounds,
        }
    }

    /// Closest hit within `ray_t`, or `None`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        match self {
            Bvh::Empty => None,

            Bvh::Leaf { triangles, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let mut closest: Option<Hit> = None;
                let mut max = ray_t.max;
                for tri in triangles {
                    if let Some(hit) = tri.hit(ray, Interval::new(ray_t.min, max)) {
                        max = hit.t;
                        closest = Some(hit);
                    }
                }
                closest
            }

            Bvh::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.hit(ray, ray_t);

                // Only search the right side up to the closest hit so far
                let right_max = hit_left.map_or(ray_t.max, |h| h.t);
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max));

                hit_right.or(hit_left)
            }
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Bvh::Empty => Aabb::EMPTY,
            Bvh::Leaf { bbox, .. } => *bbox,
            Bvh::Branch { bbox, .. } => *bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::Vec3;

    fn quad_at(x: f32) -> Vec<Triangle> {
        // Unit quad in the XY plane at the given x offset, z = 0
        let v = [
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x + 1.0, 0.0, 0.0),
            Vec3::new(x + 1.0, 1.0, 0.0),
            Vec3::new(x, 1.0, 0.0),
        ];
        vec![
            Triangle::new(v[0], v[1], v[2]),
            Triangle::new(v[0], v[2], v[3]),
        ]
    }

    #[test]
    fn test_empty() {
        let bvh = Bvh::build(vec![]);
        assert!(matches!(bvh, Bvh::Empty));

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_small_set_is_one_leaf() {
        let bvh = Bvh::build(quad_at(0.0));
        assert!(matches!(bvh, Bvh::Leaf { .. }));
    }

    #[test]
    fn test_large_set_splits_and_still_hits() {
        let triangles: Vec<Triangle> = (0..50).flat_map(|i| quad_at(i as f32 * 2.0)).collect();
        let bvh = Bvh::build(triangles);
        assert!(matches!(bvh, Bvh::Branch { .. }));

        // Aim at the quad at x = 40..41
        let ray = Ray::new(Vec3::new(40.5, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = bvh.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((hit.t - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_closest_of_overlapping_wins() {
        let mut triangles = quad_at(0.0);
        // A large triangle at z = -3, behind the quad at z = 0
        triangles.push(Triangle::new(
            Vec3::new(-5.0, -5.0, -3.0),
            Vec3::new(5.0, -5.0, -3.0),
            Vec3::new(0.0, 5.0, -3.0),
        ));

        let bvh = Bvh::build(triangles);
        let ray = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = bvh.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();

        // The quad at z=0 is closer than the plane at z=-3
        assert!((hit.t - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_bounding_box_covers_all() {
        let triangles: Vec<Triangle> = (0..10).flat_map(|i| quad_at(i as f32 * 3.0)).collect();
        let bvh = Bvh::build(triangles);

        let bbox = bvh.bounding_box();
        assert!(bbox.x.min <= 0.0 && bbox.x.max >= 28.0);
    }
}
