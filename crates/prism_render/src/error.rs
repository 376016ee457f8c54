use thiserror::Error;

/// Errors surfaced by the progressive renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The presentation layer refused a buffer lock or allocation.
    #[error("display error: {0}")]
    Display(String),

    /// The background render thread panicked instead of returning.
    #[error("render worker panicked")]
    Worker,
}

pub type RenderResult<T> = Result<T, RenderError>;
