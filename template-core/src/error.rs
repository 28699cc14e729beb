//! Error types for template operations.

use thiserror::Error;

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur in template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Layout descriptor is not valid JSON or lacks a `cells` field.
    #[error("Malformed layout: {0}")]
    MalformedLayout(String),

    /// Imported document does not parse as a list of pages.
    #[error("Malformed import: {0}")]
    MalformedImport(String),

    /// Container is not mounted, so its bounds cannot be computed.
    #[error("Container unavailable: {0}")]
    ContainerUnavailable(String),

    /// The page has no cells to place a new element in.
    #[error("No container available to add element")]
    NoContainerAvailable,

    /// Element not found on the page.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The document must keep at least one page.
    #[error("Cannot delete the last page")]
    CannotDeleteLastPage,

    /// A table structural edit was rejected.
    #[error("Table edit rejected: {0}")]
    TableEdit(String),

    /// Element record could not be converted into a typed element.
    #[error("Invalid element: {0}")]
    InvalidElement(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
