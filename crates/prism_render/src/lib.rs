//! Progressive tile-parallel rendering.
//!
//! The renderer owns a pyramid of framebuffers from coarse to fine and a
//! single background job that fills them level by level, so a viewer can
//! show a rough image immediately and refine it while the camera rests.

pub mod camera;
pub mod error;
pub mod framebuffer;
pub mod progressive;
pub mod tiles;

pub use camera::{Camera, RayGrid};
pub use error::{RenderError, RenderResult};
pub use framebuffer::{FrameBuffer, FrameBufferPyramid};
pub use progressive::ProgressiveRenderer;
pub use tiles::{tile_grid, Tile, TILE_GRID};
