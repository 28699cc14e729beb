//! The template orchestrator.
//!
//! [`TemplateStudio`] owns the document and the selection, and is the only
//! place pages are mutated. The editor and the live view only read the
//! current page; editor effects are applied here and followed by a refresh
//! that re-mounts the surface and re-syncs the live view.
//!
//! Every failed command leaves the model untouched and queues exactly one
//! [`Notice`].

use std::path::Path;

use template_core::{
    export_document, import_document, scaffold_page, Editor, EditorEffect, Element, ElementId,
    ElementPatch, ElementType, InputEvent, LayoutDescriptor, LayoutPreset, MockReport, Page,
    PagePatch, TableData, TemplateError, TemplateResult,
};
use template_renderer::{
    edit_to_patch, output_filename, ControlEdit, ExportFormat, LiveCanvas, Rasterizer,
    ResvgRasterizer, TemplateExporter,
};

use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::notice::{Notice, NoticeQueue};
use crate::remote::{RemoteError, TemplateClient, TemplateRecord};

/// An exported file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Suggested file name.
    pub filename: String,
    /// Output format.
    pub format: ExportFormat,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Document state and every command that changes it.
pub struct TemplateStudio<R = ResvgRasterizer> {
    pages: Vec<Page>,
    current_page: usize,
    active_element: Option<ElementId>,
    active_container: Option<String>,
    editor: Editor,
    live: LiveCanvas,
    exporter: TemplateExporter<R>,
    remote: Option<TemplateClient>,
    notices: NoticeQueue,
}

impl TemplateStudio<ResvgRasterizer> {
    /// Create a studio with one empty page.
    ///
    /// An unusable store URL leaves remote commands disabled.
    #[must_use]
    pub fn new(config: &StudioConfig) -> Self {
        let remote = match TemplateClient::with_timeout(&config.api_url, config.request_timeout()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Remote template store disabled");
                None
            }
        };
        Self::with_parts(TemplateExporter::new(config.export_config()), remote)
    }
}

impl<R: Rasterizer> TemplateStudio<R> {
    /// Create a studio from an exporter and an optional remote client.
    #[must_use]
    pub fn with_parts(exporter: TemplateExporter<R>, remote: Option<TemplateClient>) -> Self {
        let metrics = exporter.config().metrics();
        let mut studio = Self {
            pages: vec![Page::default()],
            current_page: 0,
            active_element: None,
            active_container: None,
            editor: Editor::new(metrics),
            live: LiveCanvas::new(metrics),
            exporter,
            remote,
            notices: NoticeQueue::new(),
        };
        studio.refresh();
        studio
    }

    // ---------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------

    /// All pages.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Index of the current page.
    #[must_use]
    pub const fn current_page_index(&self) -> usize {
        self.current_page
    }

    /// The current page.
    #[must_use]
    pub fn current_page(&self) -> &Page {
        &self.pages[self.current_page]
    }

    fn current_page_mut(&mut self) -> &mut Page {
        &mut self.pages[self.current_page]
    }

    /// The selected element.
    #[must_use]
    pub const fn active_element(&self) -> Option<&ElementId> {
        self.active_element.as_ref()
    }

    /// The selected container.
    #[must_use]
    pub fn active_container(&self) -> Option<&str> {
        self.active_container.as_deref()
    }

    /// The editor over the current page.
    #[must_use]
    pub const fn editor(&self) -> &Editor {
        &self.editor
    }

    /// The live view of the current page.
    #[must_use]
    pub const fn live(&self) -> &LiveCanvas {
        &self.live
    }

    /// The export pipeline.
    #[must_use]
    pub const fn exporter(&self) -> &TemplateExporter<R> {
        &self.exporter
    }

    /// Queued notices.
    #[must_use]
    pub const fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    /// Take every queued notice.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    fn refresh(&mut self) {
        let page = &self.pages[self.current_page];
        if let Err(e) = self.editor.mount(page) {
            tracing::debug!(error = %e, "Editor surface left empty");
        }
        if let Err(e) = self.live.sync(
            page,
            self.active_element.as_ref(),
            self.active_container.as_deref(),
        ) {
            tracing::debug!(error = %e, "Live view left empty");
        }
    }

    fn reported<T>(&mut self, result: StudioResult<T>) -> StudioResult<T> {
        if let Err(e) = &result {
            self.notices.push(Notice::from(e));
        }
        result
    }

    fn clear_selection(&mut self) {
        self.active_element = None;
        self.active_container = None;
    }

    // ---------------------------------------------------------------------
    // Elements
    // ---------------------------------------------------------------------

    /// Add an element to the active container, or to the least populated
    /// cell when no container is active, and select it.
    ///
    /// The active container is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoContainerAvailable`] if the page has no
    /// cells.
    pub fn add_element(
        &mut self,
        element_type: ElementType,
        chart_type: Option<&str>,
    ) -> StudioResult<ElementId> {
        let container = {
            let page = self.current_page();
            let cells = page.cells();
            self.active_container
                .clone()
                .filter(|c| cells.contains(c))
                .or_else(|| page.least_populated_cell())
        };
        let Some(container) = container else {
            return self.reported(Err(TemplateError::NoContainerAvailable.into()));
        };

        let id = self
            .current_page_mut()
            .add_element(Element::new(element_type, container.clone(), chart_type));
        tracing::info!(element = %id, kind = %element_type, container = %container, "Element added");

        self.active_element = Some(id.clone());
        self.refresh();
        Ok(id)
    }

    /// Select an element (and its container), or clear the element
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ElementNotFound`] for an unknown id.
    pub fn select_element(&mut self, id: Option<ElementId>) -> StudioResult<()> {
        match id {
            Some(id) => {
                let container = self.current_page().element(&id).map(|e| e.container_id.clone());
                let Some(container) = container else {
                    return self.reported(Err(TemplateError::ElementNotFound(id.to_string()).into()));
                };
                tracing::debug!(element = %id, "Element selected");
                self.active_element = Some(id);
                self.active_container = Some(container);
            }
            None => self.active_element = None,
        }
        self.refresh();
        Ok(())
    }

    /// Select a container, clearing the element selection.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ContainerUnavailable`] for a cell that is
    /// not in the layout.
    pub fn select_container(&mut self, name: Option<String>) -> StudioResult<()> {
        if let Some(name) = &name {
            if !self.current_page().cells().contains(name) {
                return self.reported(Err(TemplateError::ContainerUnavailable(name.clone()).into()));
            }
        }
        self.active_element = None;
        self.active_container = name;
        self.refresh();
        Ok(())
    }

    /// Apply a patch to an element on the current page.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is unknown or the patch is rejected.
    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> StudioResult<()> {
        let result = self
            .current_page_mut()
            .update_element(id, patch)
            .map_err(StudioError::from);
        self.reported(result)?;
        self.refresh();
        Ok(())
    }

    /// Delete an element from the current page.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ElementNotFound`] for an unknown id.
    pub fn delete_element(&mut self, id: &ElementId) -> StudioResult<()> {
        let result = self
            .current_page_mut()
            .remove_element(id)
            .map_err(StudioError::from);
        self.reported(result)?;
        if self.active_element.as_ref() == Some(id) {
            self.active_element = None;
        }
        tracing::info!(element = %id, "Element deleted");
        self.refresh();
        Ok(())
    }

    /// Apply an edit made through an element's in-place control.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is unknown or the edit does not
    /// apply to it.
    pub fn edit_in_place(&mut self, id: &ElementId, edit: ControlEdit) -> StudioResult<()> {
        let patch = match self.current_page().element(id) {
            Some(element) => edit_to_patch(element, edit).map_err(StudioError::from),
            None => Err(TemplateError::ElementNotFound(id.to_string()).into()),
        };
        let result = patch.and_then(|patch| {
            self.current_page_mut()
                .update_element(id, patch)
                .map_err(StudioError::from)
        });
        self.reported(result)?;
        self.refresh();
        Ok(())
    }

    /// Append a blank row to the selected table.
    ///
    /// # Errors
    ///
    /// Returns an error if no table is selected.
    pub fn table_add_row(&mut self) -> StudioResult<()> {
        self.edit_selected_table(|table| {
            table.add_row();
            Ok(())
        })
    }

    /// Remove the last row of the selected table.
    ///
    /// # Errors
    ///
    /// Returns an error if no table is selected or it has one row left.
    pub fn table_remove_row(&mut self) -> StudioResult<()> {
        self.edit_selected_table(TableData::remove_row)
    }

    /// Append a blank column to the selected table.
    ///
    /// # Errors
    ///
    /// Returns an error if no table is selected.
    pub fn table_add_column(&mut self) -> StudioResult<()> {
        self.edit_selected_table(|table| {
            table.add_column();
            Ok(())
        })
    }

    /// Remove the last column of the selected table.
    ///
    /// # Errors
    ///
    /// Returns an error if no table is selected or it has one column left.
    pub fn table_remove_column(&mut self) -> StudioResult<()> {
        self.edit_selected_table(TableData::remove_column)
    }

    fn edit_selected_table(
        &mut self,
        edit: impl FnOnce(&mut TableData) -> TemplateResult<()>,
    ) -> StudioResult<()> {
        let result = self.try_edit_selected_table(edit);
        self.reported(result)?;
        self.refresh();
        Ok(())
    }

    fn try_edit_selected_table(
        &mut self,
        edit: impl FnOnce(&mut TableData) -> TemplateResult<()>,
    ) -> StudioResult<()> {
        let id = self
            .active_element
            .clone()
            .ok_or_else(|| StudioError::InvalidInput("no table selected".to_string()))?;
        let mut kind = self
            .current_page()
            .element(&id)
            .ok_or_else(|| TemplateError::ElementNotFound(id.to_string()))?
            .kind
            .clone();
        let table = kind.table_mut().ok_or_else(|| {
            StudioError::InvalidInput("the selected element is not a table".to_string())
        })?;
        edit(table)?;
        self.current_page_mut()
            .update_element(&id, ElementPatch::kind(kind))?;
        Ok(())
    }

    /// Feed a pointer or key event to the editor and apply its effects.
    pub fn handle_input(&mut self, event: &InputEvent) {
        let effects = self.editor.handle_event(
            &self.pages[self.current_page],
            self.active_element.as_ref(),
            event,
        );

        for effect in effects {
            match effect {
                EditorEffect::UpdateElement { id, patch } => {
                    if let Err(e) = self.current_page_mut().update_element(&id, patch) {
                        tracing::debug!(element = %id, error = %e, "Dropped gesture update");
                    }
                }
                EditorEffect::DeleteElement { id } => {
                    let _ = self.delete_element(&id);
                }
                EditorEffect::SelectElement { id } => {
                    let _ = self.select_element(id);
                }
                EditorEffect::SelectContainer { name } => {
                    let _ = self.select_container(name);
                }
            }
        }
        self.refresh();
    }

    // ---------------------------------------------------------------------
    // Pages
    // ---------------------------------------------------------------------

    /// Change the current page's background or cell colors.
    pub fn update_page(&mut self, patch: PagePatch) {
        self.current_page_mut().apply(patch);
        self.refresh();
    }

    /// Replace the current page's layout, dropping elements whose cell
    /// disappears. Returns the dropped elements.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedLayout`] if the layout has no
    /// cells.
    pub fn change_layout(&mut self, layout: &LayoutDescriptor) -> StudioResult<Vec<Element>> {
        let result = self
            .current_page_mut()
            .set_layout(layout)
            .map_err(StudioError::from);
        let pruned = self.reported(result)?;

        self.active_container = None;
        if let Some(active) = &self.active_element {
            if pruned.iter().any(|e| &e.id == active) {
                self.active_element = None;
            }
        }
        tracing::info!(pruned = pruned.len(), "Layout changed");
        self.refresh();
        Ok(pruned)
    }

    /// Parse a serialized layout and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedLayout`] if it does not parse.
    pub fn change_layout_json(&mut self, serialized: &str) -> StudioResult<Vec<Element>> {
        let result = LayoutDescriptor::parse(serialized).map_err(StudioError::from);
        let layout = self.reported(result)?;
        self.change_layout(&layout)
    }

    /// Apply one of the built-in layouts, pruning like [`Self::change_layout`].
    ///
    /// # Errors
    ///
    /// Propagates [`Self::change_layout`] failures.
    pub fn apply_preset(&mut self, preset: LayoutPreset) -> StudioResult<Vec<Element>> {
        tracing::debug!(preset = %preset, "Applying layout preset");
        self.change_layout(&preset.descriptor())
    }

    /// Append a default page and go to it.
    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.current_page = self.pages.len() - 1;
        self.clear_selection();
        tracing::info!(pages = self.pages.len(), "Page added");
        self.refresh();
    }

    /// Delete the current page and go to the one before it.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::CannotDeleteLastPage`] when one page is left.
    pub fn delete_page(&mut self) -> StudioResult<()> {
        if self.pages.len() <= 1 {
            return self.reported(Err(TemplateError::CannotDeleteLastPage.into()));
        }
        self.pages.remove(self.current_page);
        self.current_page = self.current_page.saturating_sub(1);
        self.clear_selection();
        tracing::info!(pages = self.pages.len(), "Page deleted");
        self.refresh();
        Ok(())
    }

    /// Go to the previous page, if any.
    pub fn goto_prev_page(&mut self) {
        self.goto_page(self.current_page.saturating_sub(1));
    }

    /// Go to the next page, if any.
    pub fn goto_next_page(&mut self) {
        self.goto_page(self.current_page + 1);
    }

    /// Go to a page; out-of-range indices clamp to the last page.
    pub fn goto_page(&mut self, index: usize) {
        let index = index.min(self.pages.len() - 1);
        if index != self.current_page {
            self.current_page = index;
            self.clear_selection();
            tracing::debug!(page = index + 1, "Page changed");
        }
        self.refresh();
    }

    /// Fill the current page with report data.
    pub fn autofill_page(&mut self) {
        MockReport::new().fill_page(self.current_page_mut());
        tracing::info!(page = self.current_page + 1, "Report data applied to page");
        self.refresh();
    }

    /// Fill every page with report data.
    pub fn apply_mock_report_data(&mut self) {
        MockReport::new().fill_document(&mut self.pages);
        self.refresh();
    }

    /// Add a header to the first cell and a text block to every cell of the
    /// current page.
    pub fn scaffold_page(&mut self) -> Vec<ElementId> {
        let added = scaffold_page(self.current_page_mut());
        self.refresh();
        added
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    /// Start over with one empty page.
    pub fn new_document(&mut self) {
        self.replace_document(vec![Page::default()]);
    }

    fn replace_document(&mut self, pages: Vec<Page>) {
        self.pages = pages;
        self.current_page = 0;
        self.clear_selection();
        self.refresh();
    }

    /// Replace the document with an imported one.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedImport`] and keeps the current
    /// document if the JSON is not a valid document.
    pub fn import_document(&mut self, json: &str) -> StudioResult<()> {
        let result = import_document(json).map_err(StudioError::from);
        let pages = self.reported(result)?;
        tracing::info!(pages = pages.len(), "Document imported");
        self.replace_document(pages);
        Ok(())
    }

    /// Serialize the document as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_document_json(&mut self) -> StudioResult<String> {
        let result = export_document(&self.pages).map_err(StudioError::from);
        self.reported(result)
    }

    /// Export the whole document. The format follows the file name's
    /// extension and defaults to PDF.
    ///
    /// # Errors
    ///
    /// Returns [`template_renderer::RenderError::ExportFailed`] if any page
    /// fails.
    pub async fn export_current_document(
        &mut self,
        filename: Option<&str>,
    ) -> StudioResult<ExportedFile> {
        let format = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default();
        self.export_as(format, filename).await
    }

    /// Export in a given format. PNG and SVG cover the current page.
    ///
    /// # Errors
    ///
    /// Returns [`template_renderer::RenderError::ExportFailed`] on failure.
    pub async fn export_as(
        &mut self,
        format: ExportFormat,
        filename: Option<&str>,
    ) -> StudioResult<ExportedFile> {
        let result = self
            .exporter
            .export(&self.pages, format, self.current_page)
            .await
            .map(|bytes| ExportedFile {
                filename: output_filename(filename, format),
                format,
                bytes,
            })
            .map_err(StudioError::from);
        if let Ok(file) = &result {
            tracing::info!(file = %file.filename, bytes = file.bytes.len(), "Document exported");
            self.notices.push(Notice::info(
                "Export complete",
                format!("Exported {}", file.filename),
            ));
        }
        self.reported(result)
    }

    // ---------------------------------------------------------------------
    // Remote store
    // ---------------------------------------------------------------------

    fn remote(&self) -> StudioResult<TemplateClient> {
        self.remote.clone().ok_or_else(|| {
            RemoteError::Unavailable("no template server configured".to_string()).into()
        })
    }

    /// Save the document to the remote store under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, a save is already in flight,
    /// or the request fails.
    pub async fn save_to_server(&mut self, name: &str) -> StudioResult<()> {
        let name = name.trim();
        let result = if name.is_empty() {
            Err(StudioError::InvalidInput("template name is empty".to_string()))
        } else {
            match self.remote() {
                Ok(client) => client.save(name, &self.pages).await.map_err(StudioError::from),
                Err(e) => Err(e),
            }
        };
        if result.is_ok() {
            self.notices
                .push(Notice::info("Template saved", format!("Saved \"{name}\"")));
        }
        self.reported(result)
    }

    /// Replace the document with one from the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the stored document does
    /// not decode; the current document is kept.
    pub async fn load_from_server(&mut self, id: &str) -> StudioResult<()> {
        let result = match self.remote() {
            Ok(client) => client
                .get(id)
                .await
                .and_then(|record| record.decode_pages())
                .map_err(StudioError::from),
            Err(e) => Err(e),
        };
        let pages = self.reported(result)?;
        tracing::info!(template = id, pages = pages.len(), "Template loaded");
        self.replace_document(pages);
        Ok(())
    }

    /// List the templates in the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_templates(&mut self) -> StudioResult<Vec<TemplateRecord>> {
        let result = match self.remote() {
            Ok(client) => client.list().await.map_err(StudioError::from),
            Err(e) => Err(e),
        };
        self.reported(result)
    }

    /// Delete a template from the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete is already in flight or the request
    /// fails.
    pub async fn delete_template(&mut self, id: &str) -> StudioResult<()> {
        let result = match self.remote() {
            Ok(client) => client.delete(id).await.map_err(StudioError::from),
            Err(e) => Err(e),
        };
        if result.is_ok() {
            self.notices
                .push(Notice::info("Template deleted", format!("Deleted \"{id}\"")));
        }
        self.reported(result)
    }

    /// Check whether the remote store is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not.
    pub async fn check_server(&mut self) -> StudioResult<()> {
        let result = match self.remote() {
            Ok(client) => client.check().await.map_err(StudioError::from),
            Err(e) => Err(e),
        };
        self.reported(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use template_core::ElementKind;

    fn studio() -> TemplateStudio {
        TemplateStudio::new(&StudioConfig::default())
    }

    #[test]
    fn test_starts_with_one_page() {
        let studio = studio();
        assert_eq!(studio.pages().len(), 1);
        assert_eq!(studio.current_page_index(), 0);
        assert!(studio.notices().is_empty());
    }

    #[test]
    fn test_add_element_prefers_active_container() {
        let mut studio = studio();
        studio.select_container(Some("B".into())).expect("select");
        let id = studio.add_element(ElementType::Text, None).expect("add");

        let element = studio.current_page().element(&id).expect("element");
        assert_eq!(element.container_id, "B");
        assert_eq!(studio.active_element(), Some(&id));
    }

    #[test]
    fn test_add_element_without_cells_reports_once() {
        let mut studio = studio();
        studio.current_page_mut().layout = "{}".into();
        studio.refresh();

        assert!(studio.add_element(ElementType::Text, None).is_err());
        let notices = studio.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "No container available");
        assert!(studio.current_page().elements.is_empty());
    }

    #[test]
    fn test_delete_last_page_rejected() {
        let mut studio = studio();
        assert!(studio.delete_page().is_err());
        assert_eq!(studio.pages().len(), 1);
        assert_eq!(
            studio.drain_notices().first().map(|n| n.level),
            Some(NoticeLevel::Warning)
        );
    }

    #[test]
    fn test_selected_table_edits() {
        let mut studio = studio();
        let id = studio.add_element(ElementType::Table, None).expect("add");
        studio.table_add_row().expect("row");
        studio.table_add_column().expect("column");
        studio.table_remove_column().expect("remove column");

        let ElementKind::Table(table) = &studio.current_page().element(&id).expect("table").kind
        else {
            panic!("table expected");
        };
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
    }
}
