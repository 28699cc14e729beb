//! Pages and documents.
//!
//! A page owns its elements and a serialized layout; the layout is
//! re-parsed on every read so the stored string stays the single source of
//! truth. A document is an ordered list of pages and is exchanged as JSON
//! `Page[]`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId, ElementPatch};
use crate::layout::LayoutDescriptor;
use crate::{TemplateError, TemplateResult};

/// Layout of a freshly created page.
pub const DEFAULT_LAYOUT: &str = r#"{"cells":[["A","B"]]}"#;

/// Background color of a freshly created page.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

/// Cell background color of a freshly created page.
pub const DEFAULT_GRID_COLOR: &str = "#f8fafc";

/// One page of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    /// Elements in paint order.
    pub elements: Vec<Element>,
    /// Serialized [`LayoutDescriptor`].
    pub layout: String,
    /// Page background color.
    pub background_color: String,
    /// Cell background color.
    pub grid_color: String,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            layout: DEFAULT_LAYOUT.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            grid_color: DEFAULT_GRID_COLOR.to_string(),
        }
    }
}

/// Partial update of a page's settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePatch {
    /// New page background color.
    pub background_color: Option<String>,
    /// New cell background color.
    pub grid_color: Option<String>,
}

impl Page {
    /// A page with the given layout and default colors.
    #[must_use]
    pub fn with_layout(layout: &LayoutDescriptor) -> Self {
        Self {
            layout: layout
                .to_json()
                .unwrap_or_else(|_| DEFAULT_LAYOUT.to_string()),
            ..Self::default()
        }
    }

    /// Parse the page's layout.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedLayout`] if the stored layout does
    /// not parse.
    pub fn layout(&self) -> TemplateResult<LayoutDescriptor> {
        LayoutDescriptor::parse(&self.layout)
    }

    /// Distinct cell names of the current layout; empty when it is malformed.
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        self.layout()
            .map(|layout| layout.unique_cells())
            .unwrap_or_default()
    }

    /// Look up an element.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Look up an element mutably.
    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    /// Elements that live in the given cell, in paint order.
    pub fn elements_in<'a>(&'a self, cell: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.container_id == cell)
    }

    /// Append an element.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    /// Apply a patch to one element.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ElementNotFound`] if no element has this id,
    /// or the element's own error if the patch is rejected.
    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> TemplateResult<()> {
        self.element_mut(id)
            .ok_or_else(|| TemplateError::ElementNotFound(id.to_string()))?
            .apply(patch)
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ElementNotFound`] if no element has this id.
    pub fn remove_element(&mut self, id: &ElementId) -> TemplateResult<Element> {
        let index = self
            .elements
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| TemplateError::ElementNotFound(id.to_string()))?;
        Ok(self.elements.remove(index))
    }

    /// The cell holding the fewest elements; ties go to the first declared.
    #[must_use]
    pub fn least_populated_cell(&self) -> Option<String> {
        self.cells()
            .into_iter()
            .enumerate()
            .min_by_key(|(order, cell)| (self.elements_in(cell).count(), *order))
            .map(|(_, cell)| cell)
    }

    /// Replace the layout and prune elements whose cell no longer exists.
    ///
    /// Returns the pruned elements.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedLayout`] if the layout names no
    /// cells, leaving the page unchanged.
    pub fn set_layout(&mut self, layout: &LayoutDescriptor) -> TemplateResult<Vec<Element>> {
        if layout.unique_cells().is_empty() {
            return Err(TemplateError::MalformedLayout(
                "layout has no cells".to_string(),
            ));
        }
        self.layout = layout.to_json()?;
        let (kept, pruned): (Vec<_>, Vec<_>) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|e| layout.contains_cell(&e.container_id));
        self.elements = kept;
        if !pruned.is_empty() {
            tracing::debug!(count = pruned.len(), "Pruned elements outside the new layout");
        }
        Ok(pruned)
    }

    /// Apply a settings patch.
    pub fn apply(&mut self, patch: PagePatch) {
        if let Some(color) = patch.background_color {
            self.background_color = color;
        }
        if let Some(color) = patch.grid_color {
            self.grid_color = color;
        }
    }
}

/// Parse a JSON `Page[]` document.
///
/// # Errors
///
/// Returns [`TemplateError::MalformedImport`] if the input is not a non-empty
/// list of pages or reuses an element id.
pub fn import_document(json: &str) -> TemplateResult<Vec<Page>> {
    let pages: Vec<Page> =
        serde_json::from_str(json).map_err(|e| TemplateError::MalformedImport(e.to_string()))?;
    if pages.is_empty() {
        return Err(TemplateError::MalformedImport(
            "document has no pages".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for element in pages.iter().flat_map(|p| &p.elements) {
        if !seen.insert(element.id.as_str()) {
            return Err(TemplateError::MalformedImport(format!(
                "duplicate element id {}",
                element.id
            )));
        }
    }
    Ok(pages)
}

/// Serialize a document as pretty-printed JSON `Page[]`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_document(pages: &[Page]) -> TemplateResult<String> {
    serde_json::to_string_pretty(pages).map_err(TemplateError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::geometry::{MIN_ELEMENT_HEIGHT, MIN_ELEMENT_WIDTH};

    #[test]
    fn test_default_page() {
        let page = Page::default();
        assert_eq!(page.cells(), vec!["A", "B"]);
        assert_eq!(page.background_color, "#ffffff");
        assert_eq!(page.grid_color, "#f8fafc");
    }

    #[test]
    fn test_least_populated_cell_prefers_first_on_tie() {
        let mut page = Page::default();
        assert_eq!(page.least_populated_cell().as_deref(), Some("A"));

        page.add_element(Element::new(ElementType::Text, "A", None));
        assert_eq!(page.least_populated_cell().as_deref(), Some("B"));

        page.add_element(Element::new(ElementType::Text, "B", None));
        assert_eq!(page.least_populated_cell().as_deref(), Some("A"));
    }

    #[test]
    fn test_set_layout_prunes_orphans() {
        let mut page = Page::default();
        page.add_element(Element::new(ElementType::Text, "A", None));
        let b = page.add_element(Element::new(ElementType::Text, "B", None));

        let pruned = page
            .set_layout(&LayoutDescriptor::new([["A"]]))
            .expect("set layout");
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, b);
        assert!(page.elements.iter().all(|e| e.container_id == "A"));
    }

    #[test]
    fn test_set_layout_rejects_empty_cells() {
        let mut page = Page::default();
        page.add_element(Element::new(ElementType::Text, "A", None));
        let before = page.clone();

        for layout in [LayoutDescriptor { cells: Vec::new() }, LayoutDescriptor::new([["."]])] {
            assert!(matches!(
                page.set_layout(&layout),
                Err(TemplateError::MalformedLayout(_))
            ));
        }
        assert_eq!(page, before);
    }

    #[test]
    fn test_import_clamps_element_geometry() {
        let json = r#"[{"elements":[{"id":"e1","type":"text","containerId":"A",
            "x":-40,"y":-10,"width":5,"height":2,"data":{"text":"hi"}}]}]"#;
        let pages = import_document(json).expect("import");
        let element = &pages[0].elements[0];

        assert_eq!((element.x, element.y), (0.0, 0.0));
        assert_eq!(
            (element.width, element.height),
            (MIN_ELEMENT_WIDTH, MIN_ELEMENT_HEIGHT)
        );
    }

    #[test]
    fn test_malformed_layout_has_no_cells() {
        let page = Page {
            layout: "{oops".to_string(),
            ..Page::default()
        };
        assert!(page.layout().is_err());
        assert!(page.cells().is_empty());
        assert_eq!(page.least_populated_cell(), None);
    }

    #[test]
    fn test_import_rejects_non_arrays_and_duplicates() {
        assert!(matches!(
            import_document(r#"{"pages": []}"#),
            Err(TemplateError::MalformedImport(_))
        ));
        assert!(matches!(
            import_document("[]"),
            Err(TemplateError::MalformedImport(_))
        ));

        let mut page = Page::default();
        let element = Element::new(ElementType::Text, "A", None);
        page.add_element(element.clone());
        page.add_element(element);
        let json = export_document(&[page]).expect("export");
        assert!(matches!(
            import_document(&json),
            Err(TemplateError::MalformedImport(_))
        ));
    }

    #[test]
    fn test_document_round_trip() {
        let mut page = Page::default();
        page.add_element(Element::new(ElementType::Chart, "B", Some("pie")));
        page.add_element(Element::new(ElementType::Table, "A", None));
        let pages = vec![page, Page::default()];

        let json = export_document(&pages).expect("export");
        let back = import_document(&json).expect("import");
        assert_eq!(back, pages);
    }
}
