//! Render error types.

/// Failure to obtain any response from the renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Connection refused, reset, timed out, or body could not be read.
    #[error("renderer transport error: {0}")]
    Transport(String),
    /// The render target could not be built from the request.
    #[error("invalid render target: {0}")]
    InvalidTarget(String),
}

impl From<reqwest::Error> for RenderError {
    fn from(e: reqwest::Error) -> Self {
        RenderError::Transport(e.to_string())
    }
}
