// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat4_column_vector_convention() {
        // world = parent * local, applied right-to-left
        let parent = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let local = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let world = parent * local;

        let p = world.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(10.0, 5.0, 0.0));
    }
}
