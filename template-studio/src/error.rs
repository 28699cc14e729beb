//! Studio error types.

use thiserror::Error;

use crate::notice::Notice;
use crate::remote::RemoteError;

/// Result type for studio commands.
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors a studio command can fail with.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Model error.
    #[error(transparent)]
    Template(#[from] template_core::TemplateError),

    /// Rendering or export error.
    #[error(transparent)]
    Render(#[from] template_renderer::RenderError),

    /// Remote store error.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Command input was rejected before anything ran.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<&StudioError> for Notice {
    fn from(error: &StudioError) -> Self {
        match error {
            StudioError::Template(e) => e.into(),
            StudioError::Render(e) => e.into(),
            StudioError::Remote(e) => e.into(),
            StudioError::InvalidInput(message) => Self::warning("Invalid input", message.clone()),
        }
    }
}
