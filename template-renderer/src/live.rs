//! The live view of the current page.
//!
//! [`LiveCanvas`] turns the model into element views and owns one
//! [`ChartSlot`] per chart element, so every chart is disposed before it is
//! redrawn and when its element goes away.

use std::collections::HashMap;

use template_core::{ContainerBounds, ElementId, ElementKind, GridMetrics, Page};

use crate::chart::{ChartHandle, ChartRegistry, ChartSlot, ChartSpec};
use crate::element::{interactive_view, ElementView, CHART_PADDING};
use crate::error::RenderResult;

/// A grid cell as shown in the live view.
#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    /// Cell name.
    pub name: String,
    /// Page-space bounds.
    pub bounds: ContainerBounds,
    /// Whether this is the active container.
    pub active: bool,
}

/// The page grid as shown in the live view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutView {
    /// CSS `grid-template-areas` value.
    pub area_map: String,
    /// CSS `grid-template-rows` value.
    pub template_rows: String,
    /// CSS `grid-template-columns` value.
    pub template_columns: String,
    /// Cells in declaration order.
    pub cells: Vec<CellView>,
}

/// Live rendering state of the current page.
#[derive(Debug)]
pub struct LiveCanvas {
    metrics: GridMetrics,
    registry: ChartRegistry,
    layout: LayoutView,
    views: Vec<ElementView>,
    charts: HashMap<ElementId, ChartSlot>,
}

impl LiveCanvas {
    /// Create an empty live canvas.
    #[must_use]
    pub fn new(metrics: GridMetrics) -> Self {
        Self::with_registry(metrics, ChartRegistry::new())
    }

    /// Create an empty live canvas drawing charts through `registry`.
    #[must_use]
    pub fn with_registry(metrics: GridMetrics, registry: ChartRegistry) -> Self {
        Self {
            metrics,
            registry,
            layout: LayoutView::default(),
            views: Vec::new(),
            charts: HashMap::new(),
        }
    }

    /// Bring the view in line with `page`.
    ///
    /// Charts whose spec or size changed are disposed and redrawn; charts
    /// of removed elements are disposed. On a malformed layout the view is
    /// emptied and the error returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the page layout is malformed or a chart cannot
    /// be bound.
    pub fn sync(
        &mut self,
        page: &Page,
        active_element: Option<&ElementId>,
        active_container: Option<&str>,
    ) -> RenderResult<()> {
        let layout = match page.layout() {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!(error = %e, "Layout unreadable, clearing live view");
                self.unmount();
                return Err(e.into());
            }
        };

        self.layout = LayoutView {
            area_map: layout.css_area_map(),
            template_rows: layout.grid_template_rows(),
            template_columns: layout.grid_template_columns(),
            cells: layout
                .place_containers(&self.metrics)
                .into_iter()
                .map(|placed| CellView {
                    active: active_container == Some(placed.name.as_str()),
                    name: placed.name,
                    bounds: placed.bounds,
                })
                .collect(),
        };

        let visible: Vec<_> = page
            .elements
            .iter()
            .filter(|e| layout.contains_cell(&e.container_id))
            .collect();

        self.charts
            .retain(|id, _| visible.iter().any(|e| &e.id == id && matches!(e.kind, ElementKind::Chart(_))));

        for element in &visible {
            let ElementKind::Chart(data) = &element.kind else {
                continue;
            };
            let spec = ChartSpec::live(data);
            let size = (
                (element.width - CHART_PADDING * 2.0).max(1.0),
                (element.height - CHART_PADDING * 2.0).max(1.0),
            );
            let registry = &self.registry;
            let slot = self
                .charts
                .entry(element.id.clone())
                .or_insert_with(|| ChartSlot::new(registry));
            let current = slot.handle().is_some_and(|h| h.spec() == &spec && h.size() == size);
            if !current {
                slot.set(spec, size.0, size.1)?;
            }
        }

        self.views = visible
            .iter()
            .map(|e| interactive_view(e, active_element == Some(&e.id)))
            .collect();

        tracing::debug!(
            elements = self.views.len(),
            charts = self.charts.len(),
            "Live view synced"
        );
        Ok(())
    }

    /// Drop every view and dispose every chart.
    pub fn unmount(&mut self) {
        self.layout = LayoutView::default();
        self.views.clear();
        self.charts.clear();
    }

    /// Element views in paint order.
    #[must_use]
    pub fn views(&self) -> &[ElementView] {
        &self.views
    }

    /// The grid.
    #[must_use]
    pub const fn layout(&self) -> &LayoutView {
        &self.layout
    }

    /// Live chart of an element.
    #[must_use]
    pub fn chart(&self, id: &ElementId) -> Option<&ChartHandle> {
        self.charts.get(id).and_then(ChartSlot::handle)
    }

    /// Registry the live charts are bound through.
    #[must_use]
    pub const fn registry(&self) -> &ChartRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use template_core::{Element, ElementPatch, ElementType, LayoutDescriptor};

    fn chart_page() -> (Page, ElementId) {
        let mut page = Page::default();
        let id = page.add_element(Element::new(ElementType::Chart, "A", Some("bar")));
        page.add_element(Element::new(ElementType::Text, "B", None));
        (page, id)
    }

    #[test]
    fn test_sync_builds_views_and_cells() {
        let (page, id) = chart_page();
        let mut live = LiveCanvas::new(GridMetrics::A4);
        live.sync(&page, Some(&id), Some("B")).expect("sync");

        assert_eq!(live.views().len(), 2);
        assert!(live.views()[0].selected);
        assert_eq!(live.layout().area_map, "\"a b\"");
        assert!(live.layout().cells[1].active);
        assert!(live.chart(&id).is_some());
    }

    #[test]
    fn test_chart_redrawn_once_per_change() {
        let (mut page, id) = chart_page();
        let mut live = LiveCanvas::new(GridMetrics::A4);

        live.sync(&page, None, None).expect("sync");
        live.sync(&page, None, None).expect("resync");
        assert_eq!(live.registry().live_bindings(), 1);

        page.update_element(&id, ElementPatch::position(20.0, 20.0)).expect("move");
        live.sync(&page, None, None).expect("moved");
        assert_eq!(live.registry().live_bindings(), 1);

        if let Some(element) = page.element_mut(&id) {
            if let ElementKind::Chart(data) = &mut element.kind {
                data.chart_type = "pie".into();
            }
        }
        live.sync(&page, None, None).expect("retyped");
        assert_eq!(live.registry().live_bindings(), 1);
        assert_eq!(
            live.chart(&id).map(|h| h.spec().chart_type),
            Some(crate::chart::ChartType::Pie)
        );
    }

    #[test]
    fn test_removed_and_orphaned_charts_disposed() {
        let (mut page, id) = chart_page();
        let mut live = LiveCanvas::new(GridMetrics::A4);
        live.sync(&page, None, None).expect("sync");

        page.set_layout(&LayoutDescriptor::new([["B"]])).expect("relayout");
        live.sync(&page, None, None).expect("sync");
        assert!(live.chart(&id).is_none());
        assert_eq!(live.registry().live_bindings(), 0);
    }

    #[test]
    fn test_malformed_layout_clears_view() {
        let (mut page, _) = chart_page();
        let mut live = LiveCanvas::new(GridMetrics::A4);
        live.sync(&page, None, None).expect("sync");

        page.layout = "not json".into();
        assert!(live.sync(&page, None, None).is_err());
        assert!(live.views().is_empty());
        assert_eq!(live.registry().live_bindings(), 0);
    }
}
