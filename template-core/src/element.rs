//! Template elements - positioned content blocks inside a page container.
//!
//! An element serializes as a flat record
//! `{id, type, containerId, x, y, width, height, data}` where the shape of
//! `data` depends on `type`. In memory the payload is a typed
//! [`ElementKind`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Geometry, MIN_ELEMENT_HEIGHT, MIN_ELEMENT_WIDTH};
use crate::{TemplateError, TemplateResult};

/// Default element width for new elements.
pub const DEFAULT_ELEMENT_WIDTH: f32 = 200.0;

/// Default offset of new elements inside their container.
pub const DEFAULT_ELEMENT_OFFSET: f32 = 10.0;

/// Fallback font size in pixels when a CSS length cannot be read.
const FALLBACK_FONT_PX: f32 = 14.0;

/// Unique identifier for an element.
///
/// Ids generated here are UUIDs, but any string is accepted on import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First six characters, used for on-canvas labels.
    #[must_use]
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(6)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The type tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Free text block.
    Text,
    /// Heading (h1-h3).
    Header,
    /// Image from a data URL or remote URL.
    Image,
    /// Rectangular table of strings.
    Table,
    /// Chart over labelled datasets.
    Chart,
}

impl ElementType {
    /// The type's token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Header => "header",
            Self::Image => "image",
            Self::Table => "table",
            Self::Chart => "chart",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "header" => Ok(Self::Header),
            "image" => Ok(Self::Image),
            "table" => Ok(Self::Table),
            "chart" => Ok(Self::Chart),
            _ => Err(format!("Unknown element type: {s}")),
        }
    }
}

/// Heading level for header elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderSize {
    /// Level 1.
    #[default]
    H1,
    /// Level 2.
    H2,
    /// Level 3.
    H3,
}

impl HeaderSize {
    /// The HTML tag name.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
        }
    }
}

/// Payload of text and header elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextData {
    /// Text content.
    pub text: String,
    /// Text color (any CSS color string).
    pub color: String,
    /// Font size as a CSS length, e.g. `"14px"`.
    pub font_size: String,
    /// Bold weight.
    pub is_bold: bool,
    /// Italic style.
    pub is_italic: bool,
    /// Heading level (used by header elements).
    pub header_size: HeaderSize,
}

impl Default for TextData {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: "#000000".to_string(),
            font_size: "14px".to_string(),
            is_bold: false,
            is_italic: false,
            header_size: HeaderSize::H1,
        }
    }
}

impl TextData {
    /// Font size in pixels, reading `px`, `pt`, `rem`/`em` or bare numbers.
    #[must_use]
    pub fn font_size_px(&self) -> f32 {
        parse_css_length(&self.font_size).unwrap_or(FALLBACK_FONT_PX)
    }
}

/// Payload of image elements. An empty `src` renders as a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageData {
    /// Data URL or remote URL.
    pub src: String,
}

/// Payload of table elements: a rectangular, non-empty grid of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    /// Rows of cells.
    #[serde(default = "default_table")]
    pub table: Vec<Vec<String>>,
}

impl Default for TableData {
    fn default() -> Self {
        Self {
            table: default_table(),
        }
    }
}

fn default_table() -> Vec<Vec<String>> {
    vec![
        vec!["Header 1".into(), "Header 2".into(), "Header 3".into()],
        vec!["Data 1".into(), "Data 2".into(), "Data 3".into()],
    ]
}

impl TableData {
    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.table.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.table.first().map_or(0, Vec::len)
    }

    /// Pad ragged rows with blank cells and make sure at least one cell exists.
    pub fn normalize(&mut self) {
        if self.table.is_empty() {
            self.table.push(vec![String::new()]);
        }
        let columns = self.table.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for row in &mut self.table {
            row.resize(columns, String::new());
        }
    }

    /// Append a blank row with the last row's column count.
    pub fn add_row(&mut self) {
        let columns = self.table.last().map_or(1, Vec::len).max(1);
        self.table.push(vec![String::new(); columns]);
    }

    /// Remove the last row.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::TableEdit`] when only one row remains.
    pub fn remove_row(&mut self) -> TemplateResult<()> {
        if self.table.len() <= 1 {
            return Err(TemplateError::TableEdit(
                "a table keeps at least one row".to_string(),
            ));
        }
        self.table.pop();
        Ok(())
    }

    /// Append a blank cell to every row.
    pub fn add_column(&mut self) {
        for row in &mut self.table {
            row.push(String::new());
        }
    }

    /// Remove the last cell of every row.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::TableEdit`] when only one column remains.
    pub fn remove_column(&mut self) -> TemplateResult<()> {
        if self.column_count() <= 1 {
            return Err(TemplateError::TableEdit(
                "a table keeps at least one column".to_string(),
            ));
        }
        for row in &mut self.table {
            row.pop();
        }
        Ok(())
    }

    /// Replace the contents of one cell.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::TableEdit`] if the cell is out of range.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> TemplateResult<()> {
        let cell = self
            .table
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or_else(|| TemplateError::TableEdit(format!("no cell at ({row}, {column})")))?;
        *cell = value.into();
        Ok(())
    }
}

/// A dataset color: one color for the whole series or one per data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Paint {
    /// Single color.
    Solid(String),
    /// Per-point colors, cycled when shorter than the data.
    PerPoint(Vec<String>),
}

impl Paint {
    /// Color for the data point at `index`, if any.
    #[must_use]
    pub fn color_at(&self, index: usize) -> Option<&str> {
        match self {
            Self::Solid(color) => Some(color),
            Self::PerPoint(colors) if colors.is_empty() => None,
            Self::PerPoint(colors) => Some(&colors[index % colors.len()]),
        }
    }
}

/// One data series of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    /// Series label.
    pub label: String,
    /// Values, one per chart label.
    pub data: Vec<f64>,
    /// Fill color(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Paint>,
    /// Stroke color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

/// Payload of chart elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ChartDataRecord")]
pub struct ChartData {
    /// Chart type token (`bar`, `line`, `pie`, `doughnut`, `radar`). Empty
    /// when the document never chose one; renders as a bar chart.
    pub chart_type: String,
    /// Category labels.
    pub labels: Vec<String>,
    /// Data series.
    pub datasets: Vec<Dataset>,
}

impl Default for ChartData {
    fn default() -> Self {
        Self::sample(None)
    }
}

impl ChartData {
    /// The sample chart new chart elements start with.
    #[must_use]
    pub fn sample(chart_type: Option<&str>) -> Self {
        let chart_type = chart_type.unwrap_or("bar");
        let (fill, stroke) = if chart_type == "line" {
            ("rgba(75, 192, 192, 0.2)", "rgba(75, 192, 192, 1)")
        } else {
            ("rgba(153, 102, 255, 0.2)", "rgba(153, 102, 255, 1)")
        };
        Self {
            chart_type: chart_type.to_string(),
            labels: ["Jan", "Feb", "Mar", "Apr"].map(String::from).to_vec(),
            datasets: vec![Dataset {
                label: "Sample Data".to_string(),
                data: vec![65.0, 59.0, 80.0, 81.0],
                background_color: Some(Paint::Solid(fill.to_string())),
                border_color: Some(stroke.to_string()),
            }],
        }
    }
}

/// Wire form of chart data; older documents nest labels and datasets under
/// `chartData`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartDataRecord {
    chart_type: Option<String>,
    labels: Option<Vec<String>>,
    datasets: Option<Vec<Dataset>>,
    chart_data: Option<NestedChartData>,
}

#[derive(Deserialize)]
struct NestedChartData {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    datasets: Vec<Dataset>,
}

impl From<ChartDataRecord> for ChartData {
    fn from(record: ChartDataRecord) -> Self {
        let (nested_labels, nested_datasets) = record
            .chart_data
            .map(|n| (n.labels, n.datasets))
            .unwrap_or_default();
        Self {
            chart_type: record.chart_type.unwrap_or_default(),
            labels: record.labels.unwrap_or(nested_labels),
            datasets: record.datasets.unwrap_or(nested_datasets),
        }
    }
}

/// Typed element payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Free text block.
    Text(TextData),
    /// Heading.
    Header(TextData),
    /// Image.
    Image(ImageData),
    /// Table.
    Table(TableData),
    /// Chart.
    Chart(ChartData),
}

impl ElementKind {
    /// The kind's type tag.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Header(_) => ElementType::Header,
            Self::Image(_) => ElementType::Image,
            Self::Table(_) => ElementType::Table,
            Self::Chart(_) => ElementType::Chart,
        }
    }

    /// Default payload for a newly added element of the given type.
    #[must_use]
    pub fn new_default(element_type: ElementType, chart_type: Option<&str>) -> Self {
        match element_type {
            ElementType::Text => Self::Text(TextData {
                text: "New Text".to_string(),
                ..TextData::default()
            }),
            ElementType::Header => Self::Header(TextData {
                text: "New Header".to_string(),
                font_size: "24px".to_string(),
                is_bold: true,
                ..TextData::default()
            }),
            ElementType::Image => Self::Image(ImageData::default()),
            ElementType::Table => Self::Table(TableData::default()),
            ElementType::Chart => Self::Chart(ChartData::sample(chart_type)),
        }
    }

    /// Text payload of text and header elements.
    #[must_use]
    pub fn text_data(&self) -> Option<&TextData> {
        match self {
            Self::Text(data) | Self::Header(data) => Some(data),
            _ => None,
        }
    }

    /// Table payload, if this is a table.
    pub fn table_mut(&mut self) -> Option<&mut TableData> {
        match self {
            Self::Table(data) => Some(data),
            _ => None,
        }
    }

    fn data_value(&self) -> serde_json::Value {
        let value = match self {
            Self::Text(data) | Self::Header(data) => serde_json::to_value(data),
            Self::Image(data) => serde_json::to_value(data),
            Self::Table(data) => serde_json::to_value(data),
            Self::Chart(data) => serde_json::to_value(data),
        };
        value.unwrap_or_default()
    }

    fn from_record(element_type: ElementType, data: serde_json::Value) -> TemplateResult<Self> {
        let data = if data.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            data
        };
        let kind = match element_type {
            ElementType::Text => Self::Text(serde_json::from_value(data)?),
            ElementType::Header => Self::Header(serde_json::from_value(data)?),
            ElementType::Image => Self::Image(serde_json::from_value(data)?),
            ElementType::Table => {
                let mut table: TableData = serde_json::from_value(data)?;
                table.normalize();
                Self::Table(table)
            }
            ElementType::Chart => Self::Chart(serde_json::from_value(data)?),
        };
        Ok(kind)
    }
}

/// A positioned content block inside a page container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementRecord", into = "ElementRecord")]
pub struct Element {
    /// Unique identifier, fixed at creation.
    pub id: ElementId,
    /// Name of the layout cell that owns this element.
    pub container_id: String,
    /// X offset inside the container.
    pub x: f32,
    /// Y offset inside the container.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Typed payload.
    pub kind: ElementKind,
}

impl Element {
    /// Create a new element of the given type with default payload and size.
    #[must_use]
    pub fn new(element_type: ElementType, container_id: impl Into<String>, chart_type: Option<&str>) -> Self {
        let height = match element_type {
            ElementType::Header => 40.0,
            ElementType::Image => 150.0,
            ElementType::Text | ElementType::Table | ElementType::Chart => 100.0,
        };
        Self {
            id: ElementId::new(),
            container_id: container_id.into(),
            x: DEFAULT_ELEMENT_OFFSET,
            y: DEFAULT_ELEMENT_OFFSET,
            width: DEFAULT_ELEMENT_WIDTH,
            height,
            kind: ElementKind::new_default(element_type, chart_type),
        }
    }

    /// Create an element from an explicit payload.
    #[must_use]
    pub fn with_kind(kind: ElementKind, container_id: impl Into<String>, geometry: Geometry) -> Self {
        let mut element = Self {
            id: ElementId::new(),
            container_id: container_id.into(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            kind,
        };
        element.set_geometry(geometry);
        element
    }

    /// The element's type tag.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Current geometry.
    #[must_use]
    pub const fn geometry(&self) -> Geometry {
        Geometry::new(self.x, self.y, self.width, self.height)
    }

    /// Replace the geometry, keeping it non-negative and at least the minimum size.
    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.x = geometry.x.max(0.0);
        self.y = geometry.y.max(0.0);
        self.width = geometry.width.max(MIN_ELEMENT_WIDTH);
        self.height = geometry.height.max(MIN_ELEMENT_HEIGHT);
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidElement`] if the patch would change the
    /// element's type.
    pub fn apply(&mut self, patch: ElementPatch) -> TemplateResult<()> {
        if let Some(kind) = &patch.kind {
            if kind.element_type() != self.element_type() {
                return Err(TemplateError::InvalidElement(format!(
                    "cannot turn {} element {} into {}",
                    self.element_type(),
                    self.id,
                    kind.element_type()
                )));
            }
        }

        let current = self.geometry();
        self.set_geometry(Geometry::new(
            patch.x.unwrap_or(current.x),
            patch.y.unwrap_or(current.y),
            patch.width.unwrap_or(current.width),
            patch.height.unwrap_or(current.height),
        ));
        if let Some(container_id) = patch.container_id {
            self.container_id = container_id;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        Ok(())
    }
}

/// Partial update of an element. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    /// New x offset.
    pub x: Option<f32>,
    /// New y offset.
    pub y: Option<f32>,
    /// New width.
    pub width: Option<f32>,
    /// New height.
    pub height: Option<f32>,
    /// Move to another container.
    pub container_id: Option<String>,
    /// Replacement payload (must keep the element type).
    pub kind: Option<ElementKind>,
}

impl ElementPatch {
    /// A patch that changes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A patch that moves the element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// A patch that replaces the whole geometry.
    #[must_use]
    pub fn geometry(geometry: Geometry) -> Self {
        Self {
            x: Some(geometry.x),
            y: Some(geometry.y),
            width: Some(geometry.width),
            height: Some(geometry.height),
            ..Self::default()
        }
    }

    /// A patch that replaces the payload.
    #[must_use]
    pub fn kind(kind: ElementKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the patch touches position or size.
    #[must_use]
    pub fn touches_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }
}

/// Wire form of an element.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementRecord {
    id: ElementId,
    #[serde(rename = "type")]
    element_type: ElementType,
    container_id: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    data: serde_json::Value,
}

impl TryFrom<ElementRecord> for Element {
    type Error = TemplateError;

    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        let kind = ElementKind::from_record(record.element_type, record.data)
            .map_err(|e| TemplateError::InvalidElement(format!("{}: {e}", record.id)))?;
        let mut element = Self {
            id: record.id,
            container_id: record.container_id,
            x: 0.0,
            y: 0.0,
            width: MIN_ELEMENT_WIDTH,
            height: MIN_ELEMENT_HEIGHT,
            kind,
        };
        element.set_geometry(Geometry::new(record.x, record.y, record.width, record.height));
        Ok(element)
    }
}

impl From<Element> for ElementRecord {
    fn from(element: Element) -> Self {
        Self {
            element_type: element.element_type(),
            data: element.kind.data_value(),
            id: element.id,
            container_id: element.container_id,
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
        }
    }
}

/// Parse a CSS length into pixels (`px`, `pt`, `rem`, `em` or unitless).
#[must_use]
pub fn parse_css_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let (number, scale) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, 4.0 / 3.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, 16.0)
    } else {
        (value, 1.0)
    };
    number
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_element_defaults() {
        let text = Element::new(ElementType::Text, "A", None);
        assert_eq!(text.geometry(), Geometry::new(10.0, 10.0, 200.0, 100.0));
        assert_eq!(text.kind.text_data().map(|d| d.text.as_str()), Some("New Text"));

        let header = Element::new(ElementType::Header, "A", None);
        assert_eq!(header.height, 40.0);
        let data = header.kind.text_data().expect("header has text");
        assert!(data.is_bold);
        assert_eq!(data.font_size, "24px");

        let image = Element::new(ElementType::Image, "A", None);
        assert_eq!(image.height, 150.0);

        let chart = Element::new(ElementType::Chart, "A", Some("line"));
        match &chart.kind {
            ElementKind::Chart(c) => {
                assert_eq!(c.chart_type, "line");
                assert_eq!(c.labels.len(), 4);
            }
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn test_wire_format_is_flat() {
        let element = Element::new(ElementType::Table, "B", None);
        let json = serde_json::to_value(&element).expect("serialize");
        assert_eq!(json["type"], "table");
        assert_eq!(json["containerId"], "B");
        assert_eq!(json["data"]["table"][0][0], "Header 1");

        let back: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, element);
    }

    #[test]
    fn test_legacy_chart_data_is_flattened() {
        let json = serde_json::json!({
            "id": "abc123def",
            "type": "chart",
            "containerId": "A",
            "x": 10, "y": 10, "width": 200, "height": 100,
            "data": {
                "chartType": "line",
                "chartData": {
                    "labels": ["Jan", "Feb"],
                    "datasets": [{"label": "Sales", "data": [1, 2], "backgroundColor": "#ff0000"}]
                }
            }
        });
        let element: Element = serde_json::from_value(json).expect("deserialize");
        let ElementKind::Chart(chart) = &element.kind else {
            panic!("expected chart");
        };
        assert_eq!(chart.chart_type, "line");
        assert_eq!(chart.labels, vec!["Jan", "Feb"]);
        assert_eq!(chart.datasets[0].data, vec![1.0, 2.0]);
        assert_eq!(element.id.short(), "abc123");
    }

    #[test]
    fn test_per_point_colors() {
        let json = serde_json::json!({"label": "x", "data": [1], "backgroundColor": ["#111", "#222"]});
        let dataset: Dataset = serde_json::from_value(json).expect("dataset");
        let paint = dataset.background_color.expect("paint");
        assert_eq!(paint.color_at(3), Some("#222"));
    }

    #[test]
    fn test_table_row_and_column_edits() {
        let mut table = TableData::default();
        table.add_row();
        assert_eq!(table.row_count(), 3);
        assert!(table.table[2].iter().all(String::is_empty));

        table.add_column();
        assert_eq!(table.row_count(), 3);
        assert!(table.table.iter().all(|row| row.len() == 4));
        assert!(table.table.iter().all(|row| row[3].is_empty()));

        table.remove_row().expect("remove");
        table.remove_row().expect("remove");
        assert!(table.remove_row().is_err());
        assert_eq!(table.row_count(), 1);

        table.set_cell(0, 1, "edited").expect("set cell");
        assert_eq!(table.table[0][1], "edited");
        assert!(table.set_cell(5, 0, "nope").is_err());
    }

    #[test]
    fn test_ragged_table_is_normalized_on_import() {
        let json = serde_json::json!({
            "id": "t1", "type": "table", "containerId": "A",
            "x": 0, "y": 0, "width": 100, "height": 50,
            "data": {"table": [["a", "b", "c"], ["d"]]}
        });
        let element: Element = serde_json::from_value(json).expect("deserialize");
        let ElementKind::Table(table) = &element.kind else {
            panic!("expected table");
        };
        assert_eq!(table.table[1], vec!["d", "", ""]);
    }

    #[test]
    fn test_patch_rejects_type_change() {
        let mut element = Element::new(ElementType::Text, "A", None);
        let patch = ElementPatch::kind(ElementKind::Image(ImageData::default()));
        assert!(element.apply(patch).is_err());

        element
            .apply(ElementPatch {
                width: Some(10.0),
                x: Some(-5.0),
                ..ElementPatch::default()
            })
            .expect("geometry patch");
        assert_eq!(element.width, MIN_ELEMENT_WIDTH);
        assert_eq!(element.x, 0.0);
    }

    #[test]
    fn test_css_length_parsing() {
        assert_eq!(parse_css_length("14px"), Some(14.0));
        assert_eq!(parse_css_length("1.5rem"), Some(24.0));
        assert_eq!(parse_css_length("12pt"), Some(16.0));
        assert_eq!(parse_css_length("18"), Some(18.0));
        assert_eq!(parse_css_length("large"), None);
    }
}
