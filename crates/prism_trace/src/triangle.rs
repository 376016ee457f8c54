//! Triangle primitive.
//!
//! Möller-Trumbore intersection with a pre-computed face normal.

use prism_math::{Aabb, Interval, Ray, Vec3};

use crate::Hit;

pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Unit face normal. Zero for degenerate triangles, which the
    /// intersection test rejects anyway.
    normal: Vec3,
    bbox: Aabb,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();

        // Pad thin dimensions so axis-aligned triangles still have a slab
        let delta = Vec3::splat(0.0001);
        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);
        let bbox = Aabb::from_points(min - delta, max + delta);

        Self {
            v0,
            v1,
            v2,
            normal,
            bbox,
        }
    }

    /// Möller-Trumbore ray-triangle intersection.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Parallel (or degenerate)
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.contains(t) {
            return None;
        }

        // Normal always points against the ray
        let normal = if ray.direction.dot(self.normal) < 0.0 {
            self.normal
        } else {
            -self.normal
        };

        Some(Hit {
            t,
            point: ray.at(t),
            normal,
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
