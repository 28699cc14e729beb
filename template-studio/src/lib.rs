//! # Template Studio
//!
//! The orchestrator for report templates. [`TemplateStudio`] owns the
//! document and the selection, applies editor effects, keeps the live view
//! in sync, runs exports and talks to the remote template store.
//!
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod notice;
pub mod remote;
pub mod studio;

pub use config::StudioConfig;
pub use error::{StudioError, StudioResult};
pub use notice::{Notice, NoticeLevel, NoticeQueue};
pub use remote::{RemoteError, RemoteResult, TemplateClient, TemplateRecord, DEFAULT_API_URL};
pub use studio::{ExportedFile, TemplateStudio};

/// Studio crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
