use crate::{Interval, Mat4, Ray, Vec3};

/// Axis-aligned bounding box, one interval per axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Build from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        };
        aabb.pad_to_minimums();
        aabb
    }

    /// The smallest box containing both boxes.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&a.x, &b.x),
            y: Interval::surrounding(&a.y, &b.y),
            z: Interval::surrounding(&a.z, &b.z),
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Slab test: does the ray cross the box within ray_t?
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        for axis in 0..3 {
            let (slab, orig, dir) = match axis {
                0 => (self.x, r.origin.x, r.direction.x),
                1 => (self.y, r.origin.y, r.direction.y),
                _ => (self.z, r.origin.z, r.direction.z),
            };

            let inv_d = 1.0 / dir;
            let mut t0 = (slab.min - orig) * inv_d;
            let mut t1 = (slab.max - orig) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }

            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }

    /// Index of the axis with the largest extent (0=X, 1=Y, 2=Z).
    pub fn longest_axis(&self) -> usize {
        let x = self.x.size();
        let y = self.y.size();
        let z = self.z.size();

        if x > y && x > z {
            0
        } else if y > z {
            1
        } else {
            2
        }
    }

    /// Bounding box of the 8 transformed corners.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        let lo = self.min();
        let hi = self.max();

        let mut out_min = Vec3::splat(f32::INFINITY);
        let mut out_max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            let p = m.transform_point3(corner);
            out_min = out_min.min(p);
            out_max = out_max.max(p);
        }

        Aabb::from_points(out_min, out_max)
    }

    /// Pad near-zero-width axes so the slab test stays well defined.
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_orders_corners() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, -5.0));

        assert_eq!(aabb.x.min, 0.0);
        assert_eq!(aabb.x.max, 10.0);
        assert_eq!(aabb.z.min, -5.0);
        assert_eq!(aabb.z.max, 5.0);
    }

    #[test]
    fn test_hit() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        let toward = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit(&toward, Interval::new(0.0, 100.0)));

        let away = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!aabb.hit(&away, Interval::new(0.0, 100.0)));

        let offset = Ray::new(Vec3::new(10.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.hit(&offset, Interval::new(0.0, 100.0)));
    }

    #[test]
    fn test_longest_axis() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 2.0));
        assert_eq!(aabb.longest_axis(), 1);
    }

    #[test]
    fn test_transformed_translation() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0)));

        assert!((moved.min() - Vec3::splat(5.0)).length() < 0.001);
        assert!((moved.max() - Vec3::splat(6.0)).length() < 0.001);
    }

    #[test]
    fn test_transformed_rotation_grows_box() {
        use std::f32::consts::FRAC_PI_4;

        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let rotated = aabb.transformed(&Mat4::from_rotation_y(FRAC_PI_4));

        // A 45 degree rotation widens the XZ footprint to sqrt(2)
        assert!((rotated.x.max - 2.0f32.sqrt()).abs() < 0.001);
    }
}
