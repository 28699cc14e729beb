//! # Template Renderer
//!
//! Element rendering and the export pipeline for template pages.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Page (model) │──▶│ PageSnapshot │──▶│ SVG          │──▶│ PNG/PDF  │
//! │              │   │ (detached)   │   │ intermediate │   │ resvg +  │
//! │              │   │ + charts     │   │              │   │ printpdf │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! The live view ([`LiveCanvas`]) and the export snapshot are built
//! independently from the same page; neither reads the other.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chart;
pub mod color;
pub mod element;
pub mod error;
pub mod export;
pub mod image;
pub mod live;
pub mod snapshot;
pub mod svg;

pub use chart::{CanvasId, ChartHandle, ChartRegistry, ChartSlot, ChartSpec, ChartType, Series};
pub use color::{safe_color, ColorRole};
pub use element::{edit_to_patch, interactive_view, Control, ControlEdit, ElementView, TextStyle};
pub use error::{RenderError, RenderResult};
pub use export::{
    output_filename, ExportConfig, ExportFormat, Rasterizer, ResvgRasterizer, TemplateExporter,
    DEFAULT_EXPORT_FILENAME,
};
pub use image::{encode_data_url, ImageFormat};
pub use live::{CellView, LayoutView, LiveCanvas};
pub use snapshot::{build_snapshot, MountGuard, PageSnapshot, SnapshotContent, SnapshotHost};
pub use svg::render_snapshot_svg;

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
