//! Layout resolution.
//!
//! A page layout is serialized as `{"cells": [["A", "B"], ["C", "C"]]}`. Each
//! distinct cell name is a container; a name repeated across grid positions
//! forms a merged region spanning the bounding box of its occurrences.
//!
//! Rows shorter than the widest row extend their last cell across the
//! remaining columns, so `[["A"], ["B", "C"]]` places `A` across the full
//! width above `B` and `C`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::ContainerBounds;
use crate::{TemplateError, TemplateResult};

/// Grid token that marks an empty slot rather than a container.
const EMPTY_SLOT: &str = ".";

/// Parsed `{cells: string[][]}` layout descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    /// Rows of cell-name tokens.
    pub cells: Vec<Vec<String>>,
}

/// Grid placement of one named cell. End indices are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridArea {
    /// First row the cell occupies.
    pub row_start: usize,
    /// Row after the last row the cell occupies.
    pub row_end: usize,
    /// First column the cell occupies.
    pub col_start: usize,
    /// Column after the last column the cell occupies.
    pub col_end: usize,
}

impl GridArea {
    /// Number of rows spanned.
    #[must_use]
    pub const fn row_span(&self) -> usize {
        self.row_end - self.row_start
    }

    /// Number of columns spanned.
    #[must_use]
    pub const fn col_span(&self) -> usize {
        self.col_end - self.col_start
    }
}

/// Page box metrics used to turn grid areas into container boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    /// Page width in logical pixels.
    pub page_width: f32,
    /// Page height in logical pixels.
    pub page_height: f32,
    /// Inner padding of the page box.
    pub padding: f32,
    /// Gap between grid tracks.
    pub gap: f32,
    /// Minimum height of a row track.
    pub min_cell_height: f32,
}

impl GridMetrics {
    /// A4 at 96 DPI, the physical page used for export.
    pub const A4: Self = Self {
        page_width: 794.0,
        page_height: 1123.0,
        padding: 16.0,
        gap: 8.0,
        min_cell_height: 200.0,
    };
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self::A4
    }
}

/// A named container placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerBox {
    /// Cell name.
    pub name: String,
    /// Grid placement.
    pub area: GridArea,
    /// Bounds relative to the page origin.
    pub bounds: ContainerBounds,
}

impl LayoutDescriptor {
    /// Create a descriptor from rows of cell names.
    #[must_use]
    pub fn new<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Parse a serialized layout.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedLayout`] if the input is not JSON or
    /// has no `cells` field.
    pub fn parse(serialized: &str) -> TemplateResult<Self> {
        serde_json::from_str(serialized).map_err(|e| TemplateError::MalformedLayout(e.to_string()))
    }

    /// Serialize the layout to its compact JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> TemplateResult<String> {
        serde_json::to_string(self).map_err(TemplateError::Serialization)
    }

    /// Distinct cell names in first-seen order.
    #[must_use]
    pub fn unique_cells(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for name in self.cells.iter().flatten() {
            if is_slot_name(name) && !seen.iter().any(|s| s == name) {
                seen.push(name.clone());
            }
        }
        seen
    }

    /// Whether `name` is one of this layout's containers.
    #[must_use]
    pub fn contains_cell(&self, name: &str) -> bool {
        is_slot_name(name) && self.cells.iter().flatten().any(|c| c == name)
    }

    /// Number of grid columns (the widest row).
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of non-empty grid rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.normalized_rows().len()
    }

    /// Rows padded to the column count by repeating each row's last token.
    #[must_use]
    pub fn normalized_rows(&self) -> Vec<Vec<&str>> {
        let columns = self.column_count();
        self.cells
            .iter()
            .filter_map(|row| {
                let last = row.last()?;
                let mut tokens: Vec<&str> = row.iter().map(String::as_str).collect();
                tokens.resize(columns, last.as_str());
                Some(tokens)
            })
            .collect()
    }

    /// The `grid-template-areas` value for this layout.
    #[must_use]
    pub fn css_area_map(&self) -> String {
        self.normalized_rows()
            .iter()
            .map(|row| {
                let names: Vec<String> = row.iter().map(|c| area_name(c)).collect();
                format!("\"{}\"", names.join(" "))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The `grid-template-rows` value: one `1fr` track per row.
    #[must_use]
    pub fn grid_template_rows(&self) -> String {
        vec!["1fr"; self.row_count()].join(" ")
    }

    /// The `grid-template-columns` value: one `1fr` track per column.
    #[must_use]
    pub fn grid_template_columns(&self) -> String {
        vec!["1fr"; self.column_count()].join(" ")
    }

    /// Grid areas of every cell, in first-seen order.
    #[must_use]
    pub fn areas(&self) -> Vec<(String, GridArea)> {
        let rows = self.normalized_rows();
        self.unique_cells()
            .into_iter()
            .filter_map(|name| {
                let mut area: Option<GridArea> = None;
                for (r, row) in rows.iter().enumerate() {
                    for (c, token) in row.iter().enumerate() {
                        if *token != name {
                            continue;
                        }
                        let a = area.get_or_insert(GridArea {
                            row_start: r,
                            row_end: r + 1,
                            col_start: c,
                            col_end: c + 1,
                        });
                        a.row_start = a.row_start.min(r);
                        a.row_end = a.row_end.max(r + 1);
                        a.col_start = a.col_start.min(c);
                        a.col_end = a.col_end.max(c + 1);
                    }
                }
                area.map(|a| (name, a))
            })
            .collect()
    }

    /// Place every container on a page with the given metrics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn place_containers(&self, metrics: &GridMetrics) -> Vec<ContainerBox> {
        let rows = self.row_count();
        let columns = self.column_count();
        if rows == 0 || columns == 0 {
            return Vec::new();
        }

        let content_width = metrics.page_width - metrics.padding * 2.0;
        let content_height = metrics.page_height - metrics.padding * 2.0;
        let col_width = (content_width - metrics.gap * (columns as f32 - 1.0)) / columns as f32;
        let row_height = ((content_height - metrics.gap * (rows as f32 - 1.0)) / rows as f32)
            .max(metrics.min_cell_height);

        self.areas()
            .into_iter()
            .map(|(name, area)| {
                let left = metrics.padding + area.col_start as f32 * (col_width + metrics.gap);
                let top = metrics.padding + area.row_start as f32 * (row_height + metrics.gap);
                let width = span_extent(col_width, metrics.gap, area.col_span());
                let height = span_extent(row_height, metrics.gap, area.row_span());
                ContainerBox {
                    name,
                    area,
                    bounds: ContainerBounds::new(left, top, width, height),
                }
            })
            .collect()
    }
}

/// Lower-cased grid-area identifier for a cell name.
#[must_use]
pub fn area_name(cell: &str) -> String {
    cell.to_lowercase()
}

fn is_slot_name(name: &str) -> bool {
    !name.is_empty() && name != EMPTY_SLOT
}

#[allow(clippy::cast_precision_loss)]
fn span_extent(track: f32, gap: f32, span: usize) -> f32 {
    track * span as f32 + gap * (span as f32 - 1.0)
}

/// Built-in layouts offered by the layout picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutPreset {
    /// `A | B`
    TwoColumns,
    /// `A | B | C`
    ThreeColumns,
    /// `A` over `B`
    TwoRows,
    /// `A | B` over `C | D`
    Grid2x2,
    /// `A`, `B` and `C` stacked
    ThreeRows,
    /// `A` across the top, `B | C` below
    TopSpan,
    /// `A | B` on top, `C` across the bottom
    BottomSpan,
    /// Tall `A` on the left, `B` over `C` on the right
    SidebarLeft,
    /// `A` over `B` on the left, tall `C` on the right
    SidebarRight,
}

const TWO_COLUMNS: &[&[&str]] = &[&["A", "B"]];
const THREE_COLUMNS: &[&[&str]] = &[&["A", "B", "C"]];
const TWO_ROWS: &[&[&str]] = &[&["A"], &["B"]];
const GRID_2X2: &[&[&str]] = &[&["A", "B"], &["C", "D"]];
const THREE_ROWS: &[&[&str]] = &[&["A"], &["B"], &["C"]];
const TOP_SPAN: &[&[&str]] = &[&["A"], &["B", "C"]];
const BOTTOM_SPAN: &[&[&str]] = &[&["A", "B"], &["C"]];
const SIDEBAR_LEFT: &[&[&str]] = &[&["A", "B"], &["A", "C"]];
const SIDEBAR_RIGHT: &[&[&str]] = &[&["A", "C"], &["B", "C"]];

impl LayoutPreset {
    /// Every preset in picker order.
    pub const ALL: [Self; 9] = [
        Self::TwoColumns,
        Self::ThreeColumns,
        Self::TwoRows,
        Self::Grid2x2,
        Self::ThreeRows,
        Self::TopSpan,
        Self::BottomSpan,
        Self::SidebarLeft,
        Self::SidebarRight,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TwoColumns => "Two Columns",
            Self::ThreeColumns => "Three Columns",
            Self::TwoRows => "Two Rows",
            Self::Grid2x2 => "Grid 2x2",
            Self::ThreeRows => "Three Rows",
            Self::TopSpan => "Top Span",
            Self::BottomSpan => "Bottom Span",
            Self::SidebarLeft => "Sidebar Left",
            Self::SidebarRight => "Sidebar Right",
        }
    }

    /// Command-line token, e.g. `two-columns`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::TwoColumns => "two-columns",
            Self::ThreeColumns => "three-columns",
            Self::TwoRows => "two-rows",
            Self::Grid2x2 => "grid-2x2",
            Self::ThreeRows => "three-rows",
            Self::TopSpan => "top-span",
            Self::BottomSpan => "bottom-span",
            Self::SidebarLeft => "sidebar-left",
            Self::SidebarRight => "sidebar-right",
        }
    }

    /// Rows of cell names.
    #[must_use]
    pub const fn rows(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::TwoColumns => TWO_COLUMNS,
            Self::ThreeColumns => THREE_COLUMNS,
            Self::TwoRows => TWO_ROWS,
            Self::Grid2x2 => GRID_2X2,
            Self::ThreeRows => THREE_ROWS,
            Self::TopSpan => TOP_SPAN,
            Self::BottomSpan => BOTTOM_SPAN,
            Self::SidebarLeft => SIDEBAR_LEFT,
            Self::SidebarRight => SIDEBAR_RIGHT,
        }
    }

    /// The preset as a layout descriptor.
    #[must_use]
    pub fn descriptor(self) -> LayoutDescriptor {
        LayoutDescriptor::new(self.rows().iter().map(|row| row.iter().copied()))
    }
}

impl fmt::Display for LayoutPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(wanted) || p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.slug()).collect();
                format!("Unknown layout preset: {s} (expected one of {})", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_unique_cells() {
        let layout = LayoutDescriptor::parse(r#"{"cells": [["A","B"],["C","C"],["B","D"]]}"#)
            .expect("should parse");
        assert_eq!(layout.unique_cells(), vec!["A", "B", "C", "D"]);
        assert!(layout.contains_cell("C"));
        assert!(!layout.contains_cell("E"));
    }

    #[test]
    fn test_parse_rejects_missing_cells() {
        assert!(matches!(
            LayoutDescriptor::parse(r#"{"rows": []}"#),
            Err(TemplateError::MalformedLayout(_))
        ));
        assert!(matches!(
            LayoutDescriptor::parse("not json"),
            Err(TemplateError::MalformedLayout(_))
        ));
    }

    #[test]
    fn test_css_area_map_with_span() {
        let layout = LayoutDescriptor::new([["A", "B"], ["C", "C"]]);
        assert_eq!(layout.css_area_map(), "\"a b\" \"c c\"");
        assert_eq!(layout.grid_template_rows(), "1fr 1fr");
    }

    #[test]
    fn test_short_rows_extend_last_cell() {
        let layout = LayoutDescriptor::parse(r#"{"cells": [["A"], ["B", "C"]]}"#).expect("parse");
        assert_eq!(layout.css_area_map(), "\"a a\" \"b c\"");

        let areas = layout.areas();
        assert_eq!(areas[0].0, "A");
        assert_eq!(areas[0].1.col_span(), 2);
        assert_eq!(areas[1].1.col_span(), 1);
    }

    #[test]
    fn test_areas_for_tall_cell() {
        let layout = LayoutDescriptor::new([["A", "B"], ["A", "C"]]);
        let areas = layout.areas();
        let (name, area) = &areas[0];
        assert_eq!(name, "A");
        assert_eq!(area.row_span(), 2);
        assert_eq!(area.col_span(), 1);
    }

    #[test]
    fn test_place_containers_two_columns() {
        let layout = LayoutDescriptor::new([["A", "B"]]);
        let boxes = layout.place_containers(&GridMetrics::A4);
        assert_eq!(boxes.len(), 2);

        let a = &boxes[0].bounds;
        let b = &boxes[1].bounds;
        assert_eq!(a.left, 16.0);
        assert_eq!(a.top, 16.0);
        assert_eq!(a.width, 377.0);
        assert_eq!(a.height, 1091.0);
        assert_eq!(b.left, 16.0 + 377.0 + 8.0);
        assert_eq!(b.right, 794.0 - 16.0);
    }

    #[test]
    fn test_row_height_has_floor() {
        let layout = LayoutDescriptor::new([["A"], ["B"], ["C"], ["D"], ["E"], ["F"]]);
        let boxes = layout.place_containers(&GridMetrics::A4);
        assert!(boxes.iter().all(|b| b.bounds.height >= 200.0));
    }

    #[test]
    fn test_empty_layout_places_nothing() {
        let layout = LayoutDescriptor::parse(r#"{"cells": []}"#).expect("parse");
        assert!(layout.unique_cells().is_empty());
        assert!(layout.place_containers(&GridMetrics::A4).is_empty());
    }

    #[test]
    fn test_empty_slot_token_is_not_a_container() {
        let layout = LayoutDescriptor::new([["A", "."]]);
        assert_eq!(layout.unique_cells(), vec!["A"]);
        assert!(!layout.contains_cell("."));
    }

    #[test]
    fn test_presets_resolve_cells() {
        let expected: [(LayoutPreset, &[&str]); 9] = [
            (LayoutPreset::TwoColumns, &["A", "B"]),
            (LayoutPreset::ThreeColumns, &["A", "B", "C"]),
            (LayoutPreset::TwoRows, &["A", "B"]),
            (LayoutPreset::Grid2x2, &["A", "B", "C", "D"]),
            (LayoutPreset::ThreeRows, &["A", "B", "C"]),
            (LayoutPreset::TopSpan, &["A", "B", "C"]),
            (LayoutPreset::BottomSpan, &["A", "B", "C"]),
            (LayoutPreset::SidebarLeft, &["A", "B", "C"]),
            (LayoutPreset::SidebarRight, &["A", "C", "B"]),
        ];
        for (preset, cells) in expected {
            assert_eq!(preset.descriptor().unique_cells(), cells, "{preset}");
        }
        assert_eq!(
            LayoutPreset::Grid2x2.descriptor().to_json().expect("json"),
            r#"{"cells":[["A","B"],["C","D"]]}"#
        );
    }

    #[test]
    fn test_preset_spans() {
        let placed = LayoutPreset::SidebarLeft
            .descriptor()
            .place_containers(&GridMetrics::A4);
        let a = placed.iter().find(|c| c.name == "A").expect("A");
        assert_eq!(a.area.row_span(), 2);
        assert_eq!(a.area.col_span(), 1);

        let placed = LayoutPreset::TopSpan.descriptor().place_containers(&GridMetrics::A4);
        let a = placed.iter().find(|c| c.name == "A").expect("A");
        assert_eq!(a.area.col_span(), 2);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("grid-2x2".parse::<LayoutPreset>(), Ok(LayoutPreset::Grid2x2));
        assert_eq!("Two Rows".parse::<LayoutPreset>(), Ok(LayoutPreset::TwoRows));
        assert!("mosaic".parse::<LayoutPreset>().is_err());
        for preset in LayoutPreset::ALL {
            assert_eq!(preset.slug().parse::<LayoutPreset>(), Ok(preset));
        }
    }
}
