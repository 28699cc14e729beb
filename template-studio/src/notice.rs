//! User-facing notices.
//!
//! Every failed command is reported once as a [`Notice`] pushed onto the
//! studio's [`NoticeQueue`]; the front end drains and shows them.

use std::collections::VecDeque;

use serde::Serialize;
use template_core::TemplateError;
use template_renderer::RenderError;

use crate::remote::RemoteError;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Success or informational message.
    Info,
    /// Recoverable problem.
    Warning,
    /// Failed command.
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Short title.
    pub title: String,
    /// Details.
    pub message: String,
}

impl Notice {
    /// An informational notice.
    #[must_use]
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    /// A warning notice.
    #[must_use]
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&TemplateError> for Notice {
    fn from(error: &TemplateError) -> Self {
        match error {
            TemplateError::NoContainerAvailable => {
                Self::warning("No container available", "Add a layout with at least one cell first.")
            }
            TemplateError::CannotDeleteLastPage => {
                Self::warning("Cannot delete page", "A document needs at least one page.")
            }
            TemplateError::MalformedImport(_) => Self::error("Import failed", error.to_string()),
            TemplateError::MalformedLayout(_) => Self::error("Invalid layout", error.to_string()),
            TemplateError::TableEdit(_) => Self::warning("Table edit rejected", error.to_string()),
            _ => Self::error("Edit failed", error.to_string()),
        }
    }
}

impl From<&RenderError> for Notice {
    fn from(error: &RenderError) -> Self {
        match error {
            RenderError::ExportFailed(_) => Self::error("Export failed", error.to_string()),
            RenderError::Template(inner) => inner.into(),
            _ => Self::error("Rendering failed", error.to_string()),
        }
    }
}

impl From<&RemoteError> for Notice {
    fn from(error: &RemoteError) -> Self {
        match error {
            RemoteError::Busy(_) => Self::warning("Please wait", error.to_string()),
            RemoteError::Unavailable(_) => Self::error("Server unavailable", error.to_string()),
            _ => Self::error("Server error", error.to_string()),
        }
    }
}

/// Drainable queue of notices, oldest first.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    notices: VecDeque<Notice>,
}

impl NoticeQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice.
    pub fn push(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::warn!(title = %notice.title, message = %notice.message, "Notice"),
            _ => tracing::debug!(title = %notice.title, message = %notice.message, "Notice"),
        }
        self.notices.push_back(notice);
    }

    /// Take every queued notice.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Most recent notice.
    #[must_use]
    pub fn last(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Number of queued notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
