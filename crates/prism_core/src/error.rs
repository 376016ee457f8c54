//! Error taxonomy for scene graph construction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a scene graph from a description.
///
/// Any of these aborts the whole build; no partial graph is returned.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("file not found: {0}")]
    ResourceNotFound(PathBuf),

    #[error("unsupported mesh file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("instance id {id} out of range ({count} objects)")]
    InvalidReference { id: u32, count: usize },

    #[error("invalid syntax in scene description: {0}")]
    InvalidSceneSyntax(String),

    #[error("triangle index {index} out of range ({vertex_count} vertices)")]
    InvalidGeometry { index: u32, vertex_count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene description: {0}")]
    Description(#[from] serde_json::Error),
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;
