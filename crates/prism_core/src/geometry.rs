//! Triangle mesh geometry owned by a scene node.

use prism_math::{Aabb, Vec3};

use crate::error::{BuildError, BuildResult};

/// An immutable triangle mesh: vertex positions plus triangle indices.
///
/// Owned exclusively by one scene node. Every index is validated against
/// the vertex count on construction, so downstream code can index without
/// checking.
#[derive(Clone, Debug)]
pub struct Geometry {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl Geometry {
    /// Create a mesh from positions and triangle indices.
    ///
    /// Fails with `InvalidGeometry` if any index refers past the vertex list.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> BuildResult<Self> {
        for &index in &indices {
            if index as usize >= positions.len() {
                return Err(BuildError::InvalidGeometry {
                    index,
                    vertex_count: positions.len(),
                });
            }
        }
        Ok(Self::from_parts(positions, indices))
    }

    fn from_parts(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = compute_bounds(&positions);
        Self {
            positions,
            indices,
            bounds,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertices of triangle i.
    pub fn triangle(&self, i: usize) -> [Vec3; 3] {
        let i0 = self.indices[i * 3] as usize;
        let i1 = self.indices[i * 3 + 1] as usize;
        let i2 = self.indices[i * 3 + 2] as usize;
        [self.positions[i0], self.positions[i1], self.positions[i2]]
    }

    /// A latitude/longitude sphere tessellation.
    ///
    /// `rings` bands of latitude, `segments` slices of longitude. Used by the
    /// demo scene and tests; indices are valid by construction.
    pub fn sphere(center: Vec3, radius: f32, rings: u32, segments: u32) -> Self {
        assert!(rings >= 2 && segments >= 3, "degenerate sphere tessellation");

        let mut positions = Vec::with_capacity((segments * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((6 * segments * (rings - 1)) as usize);

        for ring in 0..=rings {
            let phi = ring as f32 * std::f32::consts::PI / rings as f32;
            for segment in 0..segments {
                let theta = segment as f32 * std::f32::consts::TAU / segments as f32;
                positions.push(Vec3::new(
                    center.x + radius * phi.sin() * theta.sin(),
                    center.y + radius * phi.cos(),
                    center.z + radius * phi.sin() * theta.cos(),
                ));
            }

            if ring == 0 {
                continue;
            }

            for segment in 1..=segments {
                let p00 = (ring - 1) * segments + segment - 1;
                let p01 = (ring - 1) * segments + segment % segments;
                let p10 = ring * segments + segment - 1;
                let p11 = ring * segments + segment % segments;

                // Top and bottom rings collapse to a fan of triangles
                if ring > 1 {
                    indices.extend_from_slice(&[p10, p01, p00]);
                }
                if ring < rings {
                    indices.extend_from_slice(&[p11, p01, p10]);
                }
            }
        }

        Self::from_parts(positions, indices)
    }
}

fn compute_bounds(positions: &[Vec3]) -> Aabb {
    if positions.is_empty() {
        return Aabb::EMPTY;
    }

    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for pos in positions {
        min = min.min(*pos);
        max = max.max(*pos);
    }

    Aabb::from_points(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_creation() {
        let geometry = Geometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        )
        .unwrap();

        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.triangle_count(), 1);
        assert_eq!(geometry.triangle(0), [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }

    #[test]
    fn test_index_out_of_range_is_rejected() {
        let result = Geometry::new(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 2]);

        assert!(matches!(
            result,
            Err(BuildError::InvalidGeometry {
                index: 2,
                vertex_count: 2
            })
        ));
    }

    #[test]
    fn test_bounds() {
        let geometry = Geometry::new(
            vec![
                Vec3::new(-1.0, -2.0, -3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::ZERO,
            ],
            vec![0, 1, 2],
        )
        .unwrap();

        let bounds = geometry.bounds();
        assert!((bounds.x.min - (-1.0)).abs() < 0.001);
        assert!((bounds.y.max - 5.0).abs() < 0.001);
        assert!((bounds.z.max - 6.0).abs() < 0.001);
    }

    #[test]
    fn test_sphere_counts() {
        let sphere = Geometry::sphere(Vec3::ZERO, 1.0, 5, 10);

        assert_eq!(sphere.vertex_count(), (10 * 6) as usize);
        assert_eq!(sphere.triangle_count(), (2 * 10 * 4) as usize);
    }

    #[test]
    fn test_sphere_points_lie_on_radius() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let sphere = Geometry::sphere(center, 2.5, 6, 12);

        for p in sphere.positions() {
            assert!(((*p - center).length() - 2.5).abs() < 0.001);
        }
    }
}
