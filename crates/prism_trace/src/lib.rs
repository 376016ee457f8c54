//! Ray intersection against a committed scene.
//!
//! `CommittedScene` snapshots a built scene graph into a form tuned for
//! tracing: one BVH per prototype mesh, plus a flat list of world-space
//! instances. Rays are transformed into each instance's local space rather
//! than duplicating triangles per instance.

pub mod bvh;
pub mod scene;
pub mod triangle;

pub use bvh::Bvh;
pub use scene::{CommittedScene, SceneHit};
pub use triangle::Triangle;

use prism_math::Vec3;

/// Minimum ray parameter accepted by intersection tests, keeping hits from
/// starting on the surface the ray just left.
pub const T_MIN: f32 = 0.001;

/// A ray-surface intersection in the space the query ray was given in.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub t: f32,
    pub point: Vec3,
    /// Unit normal, flipped to point against the incoming ray.
    pub normal: Vec3,
}
