//! Per-element rendering.
//!
//! The two places that dispatch on the element kind live here: the
//! interactive view with its in-place controls, and the static snapshot
//! content used for export.

use template_core::{
    Element, ElementId, ElementKind, ElementPatch, ElementType, Geometry, Point, ResizeHandle,
    TemplateError,
};

use crate::chart::{ChartRegistry, ChartSpec};
use crate::color::{safe_color, ColorRole};
use crate::error::{RenderError, RenderResult};
use crate::image::{encode_data_url, is_data_url, load_image_from_data_url};
use crate::snapshot::SnapshotContent;

/// Inset between an element's frame and its chart canvas.
pub const CHART_PADDING: f32 = 4.0;

/// Inset between an element's frame and its text content.
pub const TEXT_PADDING: f32 = 8.0;

/// Styling shared by text and heading controls.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Text color as stored.
    pub color: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
}

/// The in-place control an element shows in the interactive view.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Multi-line text input.
    TextArea {
        /// Current text.
        text: String,
        /// Text styling.
        style: TextStyle,
    },
    /// Editable heading.
    ContentEditable {
        /// Heading tag (`h1`..`h3`).
        tag: &'static str,
        /// Current text.
        text: String,
        /// Text styling.
        style: TextStyle,
    },
    /// A loaded image.
    Image {
        /// Image source.
        src: String,
    },
    /// Upload prompt for an image without a source.
    FileInput,
    /// Grid of cell inputs.
    TableInputs {
        /// Cell values, row-major.
        rows: Vec<Vec<String>>,
    },
    /// Canvas a live chart is drawn onto.
    ChartCanvas {
        /// What the live chart shows.
        spec: ChartSpec,
    },
}

/// Interactive view of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
    /// Element id.
    pub id: ElementId,
    /// Badge text: the type and a short id.
    pub label: String,
    /// Position and size within the container.
    pub geometry: Geometry,
    /// Whether the element is the active element.
    pub selected: bool,
    /// Resize handles and their positions, shown only when selected.
    pub handles: Vec<(ResizeHandle, Point)>,
    /// In-place control.
    pub control: Control,
}

fn text_style(data: &template_core::TextData) -> TextStyle {
    TextStyle {
        color: data.color.clone(),
        font_size: data.font_size_px(),
        bold: data.is_bold,
        italic: data.is_italic,
    }
}

/// Build the interactive view of an element.
#[must_use]
pub fn interactive_view(element: &Element, selected: bool) -> ElementView {
    let control = match &element.kind {
        ElementKind::Text(data) => Control::TextArea {
            text: data.text.clone(),
            style: text_style(data),
        },
        ElementKind::Header(data) => Control::ContentEditable {
            tag: data.header_size.tag(),
            text: data.text.clone(),
            style: text_style(data),
        },
        ElementKind::Image(data) if data.src.is_empty() => Control::FileInput,
        ElementKind::Image(data) => Control::Image {
            src: data.src.clone(),
        },
        ElementKind::Table(data) => Control::TableInputs {
            rows: data.table.clone(),
        },
        ElementKind::Chart(data) => Control::ChartCanvas {
            spec: ChartSpec::live(data),
        },
    };

    let geometry = element.geometry();
    let handles = if selected {
        ResizeHandle::ALL
            .iter()
            .map(|h| (*h, h.anchor(geometry.size())))
            .collect()
    } else {
        Vec::new()
    };

    ElementView {
        id: element.id.clone(),
        label: format!("{} {}", element.element_type(), element.id.short()),
        geometry,
        selected,
        handles,
        control,
    }
}

/// An edit made through an in-place control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEdit {
    /// New contents of a text area.
    Text(String),
    /// New contents of a heading.
    Heading(String),
    /// New value of one table cell.
    TableCell {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
        /// Cell value.
        value: String,
    },
    /// Bytes of an uploaded image file.
    ImageUpload {
        /// File contents.
        bytes: Vec<u8>,
    },
}

/// Translate a control edit into a patch for the element.
///
/// # Errors
///
/// Returns an error if the edit does not apply to the element's type, a
/// table cell is out of range, or an upload is not a recognised image.
pub fn edit_to_patch(element: &Element, edit: ControlEdit) -> RenderResult<ElementPatch> {
    let mismatch = |expected: ElementType| {
        RenderError::Template(TemplateError::InvalidElement(format!(
            "{} edit applied to {} element {}",
            expected,
            element.element_type(),
            element.id
        )))
    };

    let kind = match edit {
        ControlEdit::Text(text) => {
            let ElementKind::Text(data) = &element.kind else {
                return Err(mismatch(ElementType::Text));
            };
            let mut data = data.clone();
            data.text = text;
            ElementKind::Text(data)
        }
        ControlEdit::Heading(text) => {
            let ElementKind::Header(data) = &element.kind else {
                return Err(mismatch(ElementType::Header));
            };
            let mut data = data.clone();
            data.text = text;
            ElementKind::Header(data)
        }
        ControlEdit::TableCell { row, column, value } => {
            let mut kind = element.kind.clone();
            kind.table_mut()
                .ok_or_else(|| mismatch(ElementType::Table))?
                .set_cell(row, column, value)?;
            kind
        }
        ControlEdit::ImageUpload { bytes } => {
            let ElementKind::Image(data) = &element.kind else {
                return Err(mismatch(ElementType::Image));
            };
            let mut data = data.clone();
            data.src = encode_data_url(&bytes)?;
            tracing::debug!(element = %element.id, size = bytes.len(), "Image uploaded");
            ElementKind::Image(data)
        }
    };

    Ok(ElementPatch::kind(kind))
}

/// Build the static export content of an element.
///
/// Charts are drawn fresh onto an offscreen canvas from `registry`; the
/// returned content owns the chart handle.
///
/// # Errors
///
/// Returns [`RenderError::Chart`] if the chart could not be bound.
pub fn snapshot_content(element: &Element, registry: &ChartRegistry) -> RenderResult<SnapshotContent> {
    let content = match &element.kind {
        ElementKind::Text(data) => SnapshotContent::Text {
            tag: "p",
            text: data.text.clone(),
            style: sanitized_style(data),
        },
        ElementKind::Header(data) => SnapshotContent::Text {
            tag: data.header_size.tag(),
            text: data.text.clone(),
            style: sanitized_style(data),
        },
        ElementKind::Image(data) => {
            if is_data_url(&data.src) && load_image_from_data_url(&data.src).is_ok() {
                SnapshotContent::Image {
                    href: data.src.clone(),
                }
            } else {
                if !data.src.is_empty() {
                    tracing::warn!(element = %element.id, "Image source not embeddable, using placeholder");
                }
                SnapshotContent::ImagePlaceholder
            }
        }
        ElementKind::Table(data) => SnapshotContent::Table {
            rows: data.table.clone(),
        },
        ElementKind::Chart(data) => {
            let canvas = registry.allocate_canvas();
            let handle = registry.bind(
                canvas,
                ChartSpec::offscreen(data),
                (element.width - CHART_PADDING * 2.0).max(1.0),
                (element.height - CHART_PADDING * 2.0).max(1.0),
            )?;
            SnapshotContent::Chart(handle)
        }
    };
    Ok(content)
}

fn sanitized_style(data: &template_core::TextData) -> TextStyle {
    TextStyle {
        color: safe_color(&data.color, ColorRole::Text),
        ..text_style(data)
    }
}
