//! # Template Core
//!
//! Core model and interaction logic for the template studio.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                template-core                │
//! ├─────────────────────────────────────────────┤
//! │  Data Model      │  Editor                  │
//! │  - Pages         │  - Mounted surface       │
//! │  - Elements      │  - Hit testing           │
//! │  - Report fill   │  - Drag/resize gestures  │
//! ├─────────────────────────────────────────────┤
//! │  Layout Resolver │  Geometry Engine         │
//! │  - Grid cells    │  - Drag clamping         │
//! │  - Area map      │  - Resize constraints    │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layout;
pub mod mock;
pub mod page;

pub use editor::{Editor, EditorEffect, Gesture, MountedNode, MountedSurface, NodeHandle};
pub use element::{
    ChartData, Dataset, Element, ElementId, ElementKind, ElementPatch, ElementType, HeaderSize,
    ImageData, Paint, TableData, TextData,
};
pub use error::{TemplateError, TemplateResult};
pub use event::{HitTarget, InputEvent, KeyModifiers};
pub use geometry::{
    clamp_drag, clamp_resize, ContainerBounds, Geometry, Point, ResizeHandle, Size,
    MIN_ELEMENT_HEIGHT, MIN_ELEMENT_WIDTH,
};
pub use layout::{ContainerBox, GridArea, GridMetrics, LayoutDescriptor, LayoutPreset};
pub use mock::{scaffold_page, MockReport};
pub use page::{export_document, import_document, Page, PagePatch};

/// Template core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
