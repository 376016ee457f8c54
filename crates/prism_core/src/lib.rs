//! Prism core - scene graph construction for the progressive viewer.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `SceneGraph`, `NodeId`, `Instance`, `Geometry`
//! - **Description loading**: classification and recursive building of the
//!   textual scene description, with sub-scene deduplication
//! - **Mesh loading**: the `MeshLoader` seam and the OBJ implementation
//!
//! # Example
//!
//! ```ignore
//! use prism_core::{ObjLoader, SceneGraphBuilder};
//!
//! let (graph, root) = SceneGraphBuilder::new(ObjLoader, "assets/")
//!     .build_file("assets/scene.json")?;
//! println!("Built {} nodes", graph.node_count());
//! ```

pub mod builder;
pub mod describe;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod loader;

pub use builder::SceneGraphBuilder;
pub use error::{BuildError, BuildResult};
pub use geometry::Geometry;
pub use graph::{Instance, NodeId, SceneGraph};
pub use loader::{MeshLoader, ObjLoader};
