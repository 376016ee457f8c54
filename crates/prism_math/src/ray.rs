use crate::{Mat4, Vec3};

/// A ray with an origin and a (not necessarily unit) direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// The point along the ray at parameter t.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Map the ray through a matrix: origin as a point, direction as a vector.
    ///
    /// The direction is left unnormalized so that t values stay comparable
    /// between the original and transformed rays.
    pub fn transformed(&self, m: &Mat4) -> Ray {
        Ray {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_transformed_keeps_t() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -2.0));
        let m = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let moved = ray.transformed(&m);

        assert_eq!(moved.origin, Vec3::new(6.0, 2.0, 3.0));
        // Direction is unaffected by translation
        assert_eq!(moved.direction, ray.direction);
        // Same t reaches the translated image of the same point
        assert_eq!(moved.at(1.5), m.transform_point3(ray.at(1.5)));
    }
}
