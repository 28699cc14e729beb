//! Report fill and page scaffolding.
//!
//! The report fill replaces element content with a fixed quarterly
//! investment report. Each element is keyed by its type and its ordinal
//! among elements of that type on the same page, so filling is
//! deterministic and idempotent. An id-keyed override table takes
//! precedence when a caller wants specific content for specific elements.

use std::collections::HashMap;

use crate::element::{
    ChartData, Dataset, Element, ElementId, ElementKind, ElementType, Paint, TextData,
};
use crate::geometry::Geometry;
use crate::page::Page;

const REPORT_TITLE: &str = "Q3 Investment Portfolio Review";

const REPORT_SUMMARY: &str = "The portfolio delivered a strong performance in Q3, driven primarily by gains in the Technology and Healthcare sectors. Net return for the quarter was 7.8%, significantly outpacing the benchmark index's 4.5%. We recommend maintaining the current allocation with a slight overweight to growth stocks.";

const REPORT_DISCLAIMER: &str = "This report is for informational purposes only and is not investment advice. Past performance is not indicative of future results.";

const KEY_METRICS: [[&str; 5]; 4] = [
    ["Metric", "Q1", "Q2", "Q3", "YTD"],
    ["Total Return", "2.1%", "4.9%", "7.8%", "16.1%"],
    ["Volatility (Ann.)", "12.5%", "11.8%", "10.5%", "10.5%"],
    ["AUM (Millions)", "$540M", "$565M", "$610M", "$610M"],
];

const SECTOR_LABELS: [&str; 5] = ["Tech", "Health", "Finance", "Energy", "Real Estate"];
const SECTOR_VALUES: [f64; 5] = [25.0, 18.0, 12.0, 8.0, 5.0];
const SECTOR_COLORS: [&str; 5] = [
    "rgba(59, 130, 246, 0.8)",
    "rgba(16, 185, 129, 0.8)",
    "rgba(245, 158, 11, 0.8)",
    "rgba(239, 68, 68, 0.8)",
    "rgba(99, 102, 241, 0.8)",
];

const TREND_LABELS: [&str; 9] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep"];
const TREND_VALUES: [f64; 9] = [100.0, 102.0, 105.0, 103.0, 108.0, 112.0, 115.0, 110.0, 118.0];

/// Report content source for [`MockReport::fill_page`].
#[derive(Debug, Clone, Default)]
pub struct MockReport {
    overrides: HashMap<ElementId, ElementKind>,
}

impl MockReport {
    /// The built-in report with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `kind` for the element with this id instead of the keyed content.
    ///
    /// Overrides whose type differs from the element's are ignored.
    #[must_use]
    pub fn with_override(mut self, id: ElementId, kind: ElementKind) -> Self {
        self.overrides.insert(id, kind);
        self
    }

    /// Fill every element of one page.
    pub fn fill_page(&self, page: &mut Page) {
        let text_total = page
            .elements
            .iter()
            .filter(|e| e.element_type() == ElementType::Text)
            .count();
        let mut ordinals: HashMap<ElementType, usize> = HashMap::new();

        for element in &mut page.elements {
            let ordinal = ordinals.entry(element.element_type()).or_insert(0);
            let index = *ordinal;
            *ordinal += 1;

            let kind = match self.overrides.get(&element.id) {
                Some(kind) if kind.element_type() == element.element_type() => kind.clone(),
                _ => report_kind(&element.kind, index, text_total),
            };
            element.kind = kind;
        }
    }

    /// Fill every page of a document.
    pub fn fill_document(&self, pages: &mut [Page]) {
        for page in pages.iter_mut() {
            self.fill_page(page);
        }
        tracing::info!(pages = pages.len(), "Applied report data");
    }

    /// A filled copy of a document.
    #[must_use]
    pub fn filled(&self, pages: &[Page]) -> Vec<Page> {
        let mut copy = pages.to_vec();
        self.fill_document(&mut copy);
        copy
    }
}

/// Report content for the `index`-th element (zero-based) of its type.
///
/// Style fields the report does not set are carried over from `current`.
#[must_use]
pub fn report_kind(current: &ElementKind, index: usize, text_total: usize) -> ElementKind {
    match current {
        ElementKind::Header(data) if index == 0 => ElementKind::Header(TextData {
            text: REPORT_TITLE.to_string(),
            is_bold: true,
            font_size: "36px".to_string(),
            color: "#1e3a8a".to_string(),
            ..data.clone()
        }),
        ElementKind::Header(data) => ElementKind::Header(TextData {
            text: format!("Section Header {index}"),
            is_bold: true,
            font_size: "24px".to_string(),
            ..data.clone()
        }),
        ElementKind::Text(data) if index == 0 => ElementKind::Text(TextData {
            text: REPORT_SUMMARY.to_string(),
            ..data.clone()
        }),
        ElementKind::Text(data) if index + 1 == text_total => ElementKind::Text(TextData {
            text: REPORT_DISCLAIMER.to_string(),
            font_size: "10px".to_string(),
            color: "#6b7280".to_string(),
            ..data.clone()
        }),
        ElementKind::Text(data) => ElementKind::Text(TextData {
            text: format!(
                "Detailed paragraph {index} about the report findings. This is a longer text block to simulate full content."
            ),
            ..data.clone()
        }),
        ElementKind::Image(data) => {
            let mut data = data.clone();
            data.src = format!("https://picsum.photos/400/300?random={}", index + 1);
            ElementKind::Image(data)
        }
        ElementKind::Table(data) => {
            let mut data = data.clone();
            data.table = KEY_METRICS
                .iter()
                .map(|row| row.iter().map(|c| (*c).to_string()).collect())
                .collect();
            ElementKind::Table(data)
        }
        ElementKind::Chart(data) if index == 0 => ElementKind::Chart(ChartData {
            chart_type: chart_type_or(&data.chart_type, "pie"),
            labels: SECTOR_LABELS.map(String::from).to_vec(),
            datasets: vec![Dataset {
                label: "Sector Allocation".to_string(),
                data: SECTOR_VALUES.to_vec(),
                background_color: Some(Paint::PerPoint(SECTOR_COLORS.map(String::from).to_vec())),
                border_color: None,
            }],
        }),
        ElementKind::Chart(data) => ElementKind::Chart(ChartData {
            chart_type: chart_type_or(&data.chart_type, "line"),
            labels: TREND_LABELS.map(String::from).to_vec(),
            datasets: vec![Dataset {
                label: "Portfolio Index Value".to_string(),
                data: TREND_VALUES.to_vec(),
                background_color: Some(Paint::Solid("rgba(59, 130, 246, 0.1)".to_string())),
                border_color: Some("rgba(59, 130, 246, 1)".to_string()),
            }],
        }),
    }
}

fn chart_type_or(current: &str, fallback: &str) -> String {
    if current.is_empty() {
        fallback.to_string()
    } else {
        current.to_string()
    }
}

/// Add a header to the first cell and a text block to every cell.
///
/// Returns the ids of the added elements.
pub fn scaffold_page(page: &mut Page) -> Vec<ElementId> {
    let cells = page.cells();
    let mut added = Vec::new();

    if let Some(first) = cells.first() {
        let header = ElementKind::Header(TextData {
            text: format!("Header for {first}"),
            font_size: "24px".to_string(),
            is_bold: true,
            ..TextData::default()
        });
        added.push(page.add_element(Element::with_kind(
            header,
            first.clone(),
            Geometry::new(10.0, 10.0, 300.0, 40.0),
        )));
    }

    for cell in &cells {
        let text = ElementKind::Text(TextData {
            text: format!(
                "This is content for cell {cell}. You can add text, images, tables, or charts here."
            ),
            ..TextData::default()
        });
        added.push(page.add_element(Element::with_kind(
            text,
            cell.clone(),
            Geometry::new(10.0, 60.0, 300.0, 80.0),
        )));
    }

    tracing::debug!(added = added.len(), "Scaffolded page");
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_page() -> Page {
        let mut page = Page::default();
        for element_type in [
            ElementType::Header,
            ElementType::Text,
            ElementType::Header,
            ElementType::Text,
            ElementType::Text,
            ElementType::Chart,
            ElementType::Chart,
            ElementType::Image,
            ElementType::Image,
        ] {
            page.add_element(Element::new(element_type, "A", None));
        }
        page
    }

    fn text_of(element: &Element) -> &str {
        element.kind.text_data().map_or("", |d| d.text.as_str())
    }

    #[test]
    fn test_report_fill_by_ordinal() {
        let mut page = report_page();
        MockReport::new().fill_page(&mut page);

        let els = &page.elements;
        assert_eq!(text_of(&els[0]), REPORT_TITLE);
        assert_eq!(els[0].kind.text_data().map(|d| d.font_size.as_str()), Some("36px"));
        assert_eq!(text_of(&els[1]), REPORT_SUMMARY);
        assert_eq!(text_of(&els[2]), "Section Header 1");
        assert!(text_of(&els[3]).starts_with("Detailed paragraph 1 "));
        assert_eq!(text_of(&els[4]), REPORT_DISCLAIMER);

        let ElementKind::Chart(sector) = &els[5].kind else {
            panic!("expected chart");
        };
        assert_eq!(sector.chart_type, "bar");
        assert_eq!(sector.labels.len(), 5);

        let ElementKind::Image(second) = &els[8].kind else {
            panic!("expected image");
        };
        assert_eq!(second.src, "https://picsum.photos/400/300?random=2");
    }

    #[test]
    fn test_unset_chart_type_gets_report_default() {
        let mut page = Page::default();
        let mut first = Element::new(ElementType::Chart, "A", None);
        let mut second = Element::new(ElementType::Chart, "B", None);
        for element in [&mut first, &mut second] {
            if let ElementKind::Chart(chart) = &mut element.kind {
                chart.chart_type.clear();
            }
        }
        page.add_element(first);
        page.add_element(second);

        MockReport::new().fill_page(&mut page);
        let types: Vec<_> = page
            .elements
            .iter()
            .filter_map(|e| match &e.kind {
                ElementKind::Chart(c) => Some(c.chart_type.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(types, vec!["pie", "line"]);
    }

    #[test]
    fn test_single_text_gets_summary() {
        let mut page = Page::default();
        page.add_element(Element::new(ElementType::Text, "A", None));
        MockReport::new().fill_page(&mut page);
        assert_eq!(text_of(&page.elements[0]), REPORT_SUMMARY);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let report = MockReport::new();
        let once = report.filled(&[report_page()]);
        let twice = report.filled(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_override_wins() {
        let mut page = report_page();
        let id = page.elements[1].id.clone();
        let custom = ElementKind::Text(TextData {
            text: "Custom".to_string(),
            ..TextData::default()
        });
        MockReport::new()
            .with_override(id, custom)
            .fill_page(&mut page);
        assert_eq!(text_of(&page.elements[1]), "Custom");
    }

    #[test]
    fn test_scaffold_page() {
        let mut page = Page::default();
        let added = scaffold_page(&mut page);
        assert_eq!(added.len(), 3);
        assert_eq!(page.elements[0].element_type(), ElementType::Header);
        assert_eq!(text_of(&page.elements[0]), "Header for A");
        assert_eq!(page.elements[2].container_id, "B");
        assert_eq!(page.elements[2].geometry(), Geometry::new(10.0, 60.0, 300.0, 80.0));
    }
}
