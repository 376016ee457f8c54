//! Mesh file loading.
//!
//! `MeshLoader` is the seam between the builder and concrete file formats;
//! the builder only ever sees a `Geometry`. Taking `&mut self` lets tests
//! substitute a counting loader to observe how often construction happens.

use std::path::Path;

use prism_math::Vec3;

use crate::error::{BuildError, BuildResult};
use crate::geometry::Geometry;

/// Loads a mesh file into an owned `Geometry`.
pub trait MeshLoader {
    fn load(&mut self, path: &Path) -> BuildResult<Geometry>;
}

/// OBJ loading via tobj. The only format shipped with the viewer.
#[derive(Debug, Default)]
pub struct ObjLoader;

impl MeshLoader for ObjLoader {
    fn load(&mut self, path: &Path) -> BuildResult<Geometry> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("obj") => load_obj(path),
            _ => Err(BuildError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn load_obj(path: &Path) -> BuildResult<Geometry> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .map_err(|e| BuildError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Merge all models into one vertex/index buffer, offsetting indices
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let base = positions.len() as u32;

        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );
        indices.extend(mesh.indices.iter().map(|&i| base + i));
    }

    log::debug!(
        "loaded {}: {} vertices, {} triangles from {} models",
        path.display(),
        positions.len(),
        indices.len() / 3,
        models.len()
    );

    Geometry::new(positions, indices)
}
