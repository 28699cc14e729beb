//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Export of the document failed; no output was produced.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Chart binding failed.
    #[error("Chart error: {0}")]
    Chart(String),

    /// Model error while building a view or applying an edit.
    #[error(transparent)]
    Template(#[from] template_core::TemplateError),
}
