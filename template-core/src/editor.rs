//! Interactive editor: mounted surface and gesture state machine.
//!
//! Mounting a page builds an arena of container and element nodes plus
//! id-to-handle maps. While a drag or resize is in progress the editor
//! writes the clamped geometry straight into the mounted node (through the
//! handle captured when the gesture started) and emits an update effect for
//! the model. Releasing the pointer emits an empty update so the owner
//! re-syncs the view from the model.

use std::collections::HashMap;

use crate::element::{ElementId, ElementKind, ElementPatch};
use crate::event::{HitTarget, InputEvent};
use crate::geometry::{
    clamp_drag, clamp_resize, ContainerBounds, Geometry, Point, ResizeHandle, Size,
};
use crate::layout::GridMetrics;
use crate::page::Page;
use crate::{TemplateError, TemplateResult};

/// Side length of a resize handle square.
pub const HANDLE_SIZE: f32 = 10.0;

/// Width of the grab band around an element's editable control.
pub const CONTROL_INSET: f32 = 6.0;

/// Index of a node in a [`MountedSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

/// A node of the mounted surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MountedNode {
    /// A layout cell.
    Container {
        /// Cell name.
        name: String,
        /// Page-relative box.
        bounds: ContainerBounds,
    },
    /// An element inside a cell.
    Element {
        /// Element id.
        id: ElementId,
        /// Owning container node.
        container: NodeHandle,
        /// Container-relative style box.
        style: Geometry,
        /// Whether the element hosts an editable control.
        editable: bool,
    },
}

/// The mounted view of one page.
#[derive(Debug, Clone)]
pub struct MountedSurface {
    metrics: GridMetrics,
    nodes: Vec<MountedNode>,
    containers: HashMap<String, NodeHandle>,
    elements: HashMap<ElementId, NodeHandle>,
    paint_order: Vec<NodeHandle>,
}

impl MountedSurface {
    /// A surface with nothing mounted.
    #[must_use]
    pub fn empty(metrics: GridMetrics) -> Self {
        Self {
            metrics,
            nodes: Vec::new(),
            containers: HashMap::new(),
            elements: HashMap::new(),
            paint_order: Vec::new(),
        }
    }

    /// Mount a page.
    ///
    /// Elements whose container is not part of the layout are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedLayout`] if the page's layout does
    /// not parse; nothing is mounted in that case.
    pub fn mount(page: &Page, metrics: GridMetrics) -> TemplateResult<Self> {
        let layout = page.layout()?;
        let mut surface = Self::empty(metrics);

        for placed in layout.place_containers(&metrics) {
            let handle = surface.push(MountedNode::Container {
                name: placed.name.clone(),
                bounds: placed.bounds,
            });
            surface.containers.insert(placed.name, handle);
        }

        for element in &page.elements {
            let Some(&container) = surface.containers.get(&element.container_id) else {
                tracing::debug!(
                    element = %element.id,
                    container = %element.container_id,
                    "Skipping element outside the layout"
                );
                continue;
            };
            let editable = match &element.kind {
                ElementKind::Text(_) | ElementKind::Header(_) | ElementKind::Table(_) => true,
                ElementKind::Image(image) => image.src.is_empty(),
                ElementKind::Chart(_) => false,
            };
            let handle = surface.push(MountedNode::Element {
                id: element.id.clone(),
                container,
                style: element.geometry(),
                editable,
            });
            surface.elements.insert(element.id.clone(), handle);
            surface.paint_order.push(handle);
        }

        Ok(surface)
    }

    fn push(&mut self, node: MountedNode) -> NodeHandle {
        self.nodes.push(node);
        NodeHandle(self.nodes.len() - 1)
    }

    /// Page metrics the surface was mounted with.
    #[must_use]
    pub const fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    /// Whether nothing is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node behind a handle.
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&MountedNode> {
        self.nodes.get(handle.0)
    }

    /// Handle of a mounted container.
    #[must_use]
    pub fn container_handle(&self, name: &str) -> Option<NodeHandle> {
        self.containers.get(name).copied()
    }

    /// Handle of a mounted element.
    #[must_use]
    pub fn element_handle(&self, id: &ElementId) -> Option<NodeHandle> {
        self.elements.get(id).copied()
    }

    /// Page-relative bounds of a mounted container.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ContainerUnavailable`] if the container is not
    /// mounted.
    pub fn container_bounds(&self, name: &str) -> TemplateResult<ContainerBounds> {
        match self.container_handle(name).and_then(|h| self.node(h)) {
            Some(MountedNode::Container { bounds, .. }) => Ok(*bounds),
            _ => Err(TemplateError::ContainerUnavailable(name.to_string())),
        }
    }

    /// Current style box of a mounted element.
    #[must_use]
    pub fn element_style(&self, id: &ElementId) -> Option<Geometry> {
        match self.element_handle(id).and_then(|h| self.node(h)) {
            Some(MountedNode::Element { style, .. }) => Some(*style),
            _ => None,
        }
    }

    /// Write a style box straight into a mounted element node.
    pub fn set_style(&mut self, handle: NodeHandle, geometry: Geometry) {
        if let Some(MountedNode::Element { style, .. }) = self.nodes.get_mut(handle.0) {
            *style = geometry;
        }
    }

    /// Detach a container and its elements.
    pub fn unmount_container(&mut self, name: &str) {
        let Some(container) = self.containers.remove(name) else {
            return;
        };
        let orphans: Vec<ElementId> = self
            .nodes
            .iter()
            .filter_map(|node| match node {
                MountedNode::Element { id, container: c, .. } if *c == container => Some(id.clone()),
                _ => None,
            })
            .collect();
        for id in orphans {
            if let Some(handle) = self.elements.remove(&id) {
                self.paint_order.retain(|h| *h != handle);
            }
        }
    }

    /// Mounted container names.
    pub fn container_names(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    /// Page-relative box of a mounted element.
    fn element_rect(&self, handle: NodeHandle) -> Option<(ElementId, ContainerBounds, bool)> {
        let MountedNode::Element {
            id,
            container,
            style,
            editable,
        } = self.node(handle)?
        else {
            return None;
        };
        let MountedNode::Container { bounds, .. } = self.node(*container)? else {
            return None;
        };
        let rect = ContainerBounds::new(
            bounds.left + style.x,
            bounds.top + style.y,
            style.width,
            style.height,
        );
        Some((id.clone(), rect, *editable))
    }

    /// Resolve a page-space point to what it lands on.
    ///
    /// Handles of the `selected` element win, then elements from topmost to
    /// bottommost, then containers, then the page background.
    #[must_use]
    pub fn hit_test(&self, point: Point, selected: Option<&ElementId>) -> HitTarget {
        let page = ContainerBounds::new(0.0, 0.0, self.metrics.page_width, self.metrics.page_height);
        if !page.contains(point) {
            return HitTarget::Outside;
        }

        if let Some((id, rect, _)) = selected
            .and_then(|id| self.element_handle(id))
            .and_then(|h| self.element_rect(h))
        {
            let half = HANDLE_SIZE / 2.0;
            let size = Size {
                width: rect.width,
                height: rect.height,
            };
            for handle in ResizeHandle::ALL {
                let anchor = handle.anchor(size);
                let zone = ContainerBounds::new(
                    rect.left + anchor.x - half,
                    rect.top + anchor.y - half,
                    HANDLE_SIZE,
                    HANDLE_SIZE,
                );
                if zone.contains(point) {
                    return HitTarget::ResizeHandle {
                        element: id,
                        handle,
                    };
                }
            }
        }

        for &handle in self.paint_order.iter().rev() {
            let Some((id, rect, editable)) = self.element_rect(handle) else {
                continue;
            };
            if !rect.contains(point) {
                continue;
            }
            let inner = ContainerBounds::new(
                rect.left + CONTROL_INSET,
                rect.top + CONTROL_INSET,
                rect.width - CONTROL_INSET * 2.0,
                rect.height - CONTROL_INSET * 2.0,
            );
            if editable && inner.contains(point) {
                return HitTarget::EditableControl { element: id };
            }
            return HitTarget::ElementBody { element: id };
        }

        for node in &self.nodes {
            if let MountedNode::Container { name, bounds } = node {
                if self.containers.contains_key(name) && bounds.contains(point) {
                    return HitTarget::Container { name: name.clone() };
                }
            }
        }

        HitTarget::PageBackground
    }
}

/// The single in-progress gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// No gesture.
    Idle,
    /// Moving an element.
    Dragging {
        /// Element being moved.
        element: ElementId,
        /// Mounted node of the element.
        node: NodeHandle,
        /// Pointer offset from the element's top-left corner.
        grab_offset: Point,
    },
    /// Resizing an element.
    Resizing {
        /// Element being resized.
        element: ElementId,
        /// Mounted node of the element.
        node: NodeHandle,
        /// Handle being dragged.
        handle: ResizeHandle,
        /// Pointer position when the gesture started.
        start_pointer: Point,
        /// Element geometry when the gesture started.
        start: Geometry,
    },
}

impl Gesture {
    /// Element the gesture operates on.
    #[must_use]
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::Idle => None,
            Self::Dragging { element, .. } | Self::Resizing { element, .. } => Some(element),
        }
    }
}

/// A model mutation requested by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEffect {
    /// Patch an element; an empty patch asks the owner to re-sync.
    UpdateElement {
        /// Element to patch.
        id: ElementId,
        /// Changes.
        patch: ElementPatch,
    },
    /// Delete an element.
    DeleteElement {
        /// Element to delete.
        id: ElementId,
    },
    /// Change the element selection.
    SelectElement {
        /// New selection.
        id: Option<ElementId>,
    },
    /// Change the container selection.
    SelectContainer {
        /// New selection.
        name: Option<String>,
    },
}

/// Gesture state machine over a mounted page.
#[derive(Debug, Clone)]
pub struct Editor {
    surface: MountedSurface,
    gesture: Gesture,
    control_focused: bool,
}

impl Editor {
    /// An editor with nothing mounted.
    #[must_use]
    pub fn new(metrics: GridMetrics) -> Self {
        Self {
            surface: MountedSurface::empty(metrics),
            gesture: Gesture::Idle,
            control_focused: false,
        }
    }

    /// Mount (or re-mount) a page.
    ///
    /// An in-progress gesture re-captures its node from the new surface, or
    /// ends if its element is gone.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedLayout`] if the layout does not
    /// parse; the surface is left empty.
    pub fn mount(&mut self, page: &Page) -> TemplateResult<()> {
        let metrics = self.surface.metrics;
        match MountedSurface::mount(page, metrics) {
            Ok(surface) => {
                self.surface = surface;
                self.recapture_gesture();
                Ok(())
            }
            Err(e) => {
                self.surface = MountedSurface::empty(metrics);
                self.gesture = Gesture::Idle;
                Err(e)
            }
        }
    }

    fn recapture_gesture(&mut self) {
        let Some(id) = self.gesture.element().cloned() else {
            return;
        };
        match self.surface.element_handle(&id) {
            Some(handle) => {
                if let Gesture::Dragging { node, .. } | Gesture::Resizing { node, .. } = &mut self.gesture {
                    *node = handle;
                }
            }
            None => {
                tracing::debug!(element = %id, "Gesture target unmounted, ending gesture");
                self.gesture = Gesture::Idle;
            }
        }
    }

    /// The mounted surface.
    #[must_use]
    pub const fn surface(&self) -> &MountedSurface {
        &self.surface
    }

    /// Mutable access to the mounted surface.
    pub fn surface_mut(&mut self) -> &mut MountedSurface {
        &mut self.surface
    }

    /// The current gesture.
    #[must_use]
    pub const fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Resolve a page-space point against the mounted surface.
    #[must_use]
    pub fn hit_test(&self, point: Point, selected: Option<&ElementId>) -> HitTarget {
        self.surface.hit_test(point, selected)
    }

    /// Feed one input event.
    ///
    /// `page` is the model the surface was mounted from and `active` the
    /// currently selected element. Returns the mutations the owner should
    /// apply, in order.
    pub fn handle_event(
        &mut self,
        page: &Page,
        active: Option<&ElementId>,
        event: &InputEvent,
    ) -> Vec<EditorEffect> {
        match event {
            InputEvent::PointerDown { position, target } => {
                let target = target
                    .clone()
                    .unwrap_or_else(|| self.surface.hit_test(*position, active));
                self.pointer_down(page, *position, target)
            }
            InputEvent::PointerMove { position } => self.pointer_move(page, *position),
            InputEvent::PointerUp | InputEvent::PointerLeave => self.pointer_up(),
            InputEvent::Key { key, .. } => match active {
                Some(id) if key == "Delete" && !self.control_focused => {
                    vec![EditorEffect::DeleteElement { id: id.clone() }]
                }
                _ => Vec::new(),
            },
        }
    }

    fn pointer_down(&mut self, page: &Page, position: Point, target: HitTarget) -> Vec<EditorEffect> {
        self.control_focused = matches!(target, HitTarget::EditableControl { .. });

        match target {
            HitTarget::ResizeHandle { element, handle } => {
                let mut effects = vec![EditorEffect::SelectElement {
                    id: Some(element.clone()),
                }];
                if let (Some(model), Some(node)) =
                    (page.element(&element), self.surface.element_handle(&element))
                {
                    tracing::debug!(element = %element, handle = %handle, "Resize started");
                    self.gesture = Gesture::Resizing {
                        element,
                        node,
                        handle,
                        start_pointer: position,
                        start: model.geometry(),
                    };
                } else {
                    effects.clear();
                }
                effects
            }
            HitTarget::ElementBody { element } => {
                let origin = page.element(&element).and_then(|model| {
                    let bounds = self.surface.container_bounds(&model.container_id).ok()?;
                    Some(Point::new(bounds.left + model.x, bounds.top + model.y))
                });
                let (Some(origin), Some(node)) = (origin, self.surface.element_handle(&element))
                else {
                    return Vec::new();
                };
                tracing::debug!(element = %element, "Drag started");
                let effects = vec![EditorEffect::SelectElement {
                    id: Some(element.clone()),
                }];
                self.gesture = Gesture::Dragging {
                    element,
                    node,
                    grab_offset: position.delta_from(origin),
                };
                effects
            }
            HitTarget::EditableControl { element } => {
                vec![EditorEffect::SelectElement { id: Some(element) }]
            }
            HitTarget::Container { name } => vec![
                EditorEffect::SelectContainer { name: Some(name) },
                EditorEffect::SelectElement { id: None },
            ],
            HitTarget::PageBackground => vec![
                EditorEffect::SelectElement { id: None },
                EditorEffect::SelectContainer { name: None },
            ],
            HitTarget::Outside => Vec::new(),
        }
    }

    fn pointer_move(&mut self, page: &Page, position: Point) -> Vec<EditorEffect> {
        let (id, node, geometry) = match &self.gesture {
            Gesture::Idle => return Vec::new(),
            Gesture::Dragging {
                element,
                node,
                grab_offset,
            } => {
                let Some(model) = page.element(element) else {
                    return Vec::new();
                };
                let Ok(bounds) = self.surface.container_bounds(&model.container_id) else {
                    tracing::debug!(container = %model.container_id, "Container unavailable, skipping frame");
                    return Vec::new();
                };
                let size = model.geometry().size();
                let origin = position.delta_from(*grab_offset);
                let at = clamp_drag(origin, size, &bounds);
                (
                    element.clone(),
                    *node,
                    Geometry::new(at.x, at.y, size.width, size.height),
                )
            }
            Gesture::Resizing {
                element,
                node,
                handle,
                start_pointer,
                start,
            } => {
                let Some(model) = page.element(element) else {
                    return Vec::new();
                };
                let Ok(bounds) = self.surface.container_bounds(&model.container_id) else {
                    tracing::debug!(container = %model.container_id, "Container unavailable, skipping frame");
                    return Vec::new();
                };
                let delta = position.delta_from(*start_pointer);
                (element.clone(), *node, clamp_resize(*handle, *start, delta, &bounds))
            }
        };

        self.surface.set_style(node, geometry);
        let patch = if matches!(self.gesture, Gesture::Dragging { .. }) {
            ElementPatch::position(geometry.x, geometry.y)
        } else {
            ElementPatch::geometry(geometry)
        };
        vec![EditorEffect::UpdateElement { id, patch }]
    }

    fn pointer_up(&mut self) -> Vec<EditorEffect> {
        let ended = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match ended.element() {
            Some(id) => {
                tracing::debug!(element = %id, "Gesture ended");
                vec![EditorEffect::UpdateElement {
                    id: id.clone(),
                    patch: ElementPatch::empty(),
                }]
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementType};

    fn page_with_chart() -> (Page, ElementId) {
        let mut page = Page::default();
        let id = page.add_element(Element::new(ElementType::Chart, "A", None));
        (page, id)
    }

    fn mounted(page: &Page) -> Editor {
        let mut editor = Editor::new(GridMetrics::A4);
        editor.mount(page).expect("mount");
        editor
    }

    #[test]
    fn test_mount_builds_handle_maps() {
        let (page, id) = page_with_chart();
        let editor = mounted(&page);
        assert!(editor.surface().container_handle("A").is_some());
        assert!(editor.surface().container_handle("B").is_some());
        assert_eq!(
            editor.surface().element_style(&id),
            Some(Geometry::new(10.0, 10.0, 200.0, 100.0))
        );
    }

    #[test]
    fn test_hit_test_layers() {
        let (page, id) = page_with_chart();
        let editor = mounted(&page);

        // Container A starts at (16, 16); the element at (26, 26).
        assert_eq!(
            editor.hit_test(Point::new(100.0, 60.0), None),
            HitTarget::ElementBody { element: id.clone() }
        );
        assert_eq!(
            editor.hit_test(Point::new(226.0, 126.0), Some(&id)),
            HitTarget::ResizeHandle {
                element: id,
                handle: ResizeHandle::BottomRight,
            }
        );
        assert_eq!(
            editor.hit_test(Point::new(300.0, 500.0), None),
            HitTarget::Container { name: "A".into() }
        );
        assert_eq!(
            editor.hit_test(Point::new(4.0, 4.0), None),
            HitTarget::PageBackground
        );
        assert_eq!(
            editor.hit_test(Point::new(-1.0, 4.0), None),
            HitTarget::Outside
        );
    }

    #[test]
    fn test_text_interior_is_editable_control() {
        let mut page = Page::default();
        let id = page.add_element(Element::new(ElementType::Text, "A", None));
        let editor = mounted(&page);
        assert_eq!(
            editor.hit_test(Point::new(100.0, 60.0), None),
            HitTarget::EditableControl { element: id.clone() }
        );
        assert_eq!(
            editor.hit_test(Point::new(28.0, 60.0), None),
            HitTarget::ElementBody { element: id }
        );
    }

    #[test]
    fn test_drag_updates_node_and_emits_patch() {
        let (page, id) = page_with_chart();
        let mut editor = mounted(&page);

        let effects = editor.handle_event(&page, None, &InputEvent::pointer_down(36.0, 36.0));
        assert_eq!(
            effects,
            vec![EditorEffect::SelectElement { id: Some(id.clone()) }]
        );
        assert!(matches!(editor.gesture(), Gesture::Dragging { .. }));

        let effects = editor.handle_event(&page, Some(&id), &InputEvent::pointer_move(110.0, 60.0));
        assert_eq!(
            effects,
            vec![EditorEffect::UpdateElement {
                id: id.clone(),
                patch: ElementPatch::position(84.0, 34.0),
            }]
        );
        assert_eq!(
            editor.surface().element_style(&id),
            Some(Geometry::new(84.0, 34.0, 200.0, 100.0))
        );

        let effects = editor.handle_event(&page, Some(&id), &InputEvent::PointerUp);
        assert_eq!(
            effects,
            vec![EditorEffect::UpdateElement {
                id,
                patch: ElementPatch::empty(),
            }]
        );
        assert_eq!(editor.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_resize_from_top_left_past_origin() {
        let (page, id) = page_with_chart();
        let mut editor = mounted(&page);

        let target = HitTarget::ResizeHandle {
            element: id.clone(),
            handle: ResizeHandle::TopLeft,
        };
        editor.handle_event(&page, Some(&id), &InputEvent::pointer_down_on(26.0, 26.0, target));
        let effects = editor.handle_event(&page, Some(&id), &InputEvent::pointer_move(-274.0, -274.0));
        assert_eq!(
            effects,
            vec![EditorEffect::UpdateElement {
                id: id.clone(),
                patch: ElementPatch::geometry(Geometry::new(0.0, 0.0, 210.0, 110.0)),
            }]
        );

        let effects = editor.handle_event(&page, Some(&id), &InputEvent::PointerLeave);
        assert_eq!(effects.len(), 1);
        assert_eq!(editor.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_move_without_container_is_noop() {
        let (page, id) = page_with_chart();
        let mut editor = mounted(&page);
        editor.handle_event(&page, None, &InputEvent::pointer_down(36.0, 36.0));
        editor.surface_mut().unmount_container("A");

        let effects = editor.handle_event(&page, Some(&id), &InputEvent::pointer_move(200.0, 200.0));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_background_clicks_clear_selection() {
        let (page, id) = page_with_chart();
        let mut editor = mounted(&page);

        let effects = editor.handle_event(&page, Some(&id), &InputEvent::pointer_down(300.0, 500.0));
        assert_eq!(
            effects,
            vec![
                EditorEffect::SelectContainer {
                    name: Some("A".into())
                },
                EditorEffect::SelectElement { id: None },
            ]
        );

        let effects = editor.handle_event(&page, None, &InputEvent::pointer_down(4.0, 4.0));
        assert_eq!(
            effects,
            vec![
                EditorEffect::SelectElement { id: None },
                EditorEffect::SelectContainer { name: None },
            ]
        );
        assert_eq!(editor.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_delete_key() {
        let (page, id) = page_with_chart();
        let mut editor = mounted(&page);

        assert!(editor
            .handle_event(&page, None, &InputEvent::key("Delete"))
            .is_empty());
        assert_eq!(
            editor.handle_event(&page, Some(&id), &InputEvent::key("Delete")),
            vec![EditorEffect::DeleteElement { id: id.clone() }]
        );
        assert!(editor
            .handle_event(&page, Some(&id), &InputEvent::key("Backspace"))
            .is_empty());
    }

    #[test]
    fn test_editable_control_passes_through() {
        let mut page = Page::default();
        let id = page.add_element(Element::new(ElementType::Text, "A", None));
        let mut editor = mounted(&page);

        let effects = editor.handle_event(&page, None, &InputEvent::pointer_down(100.0, 60.0));
        assert_eq!(
            effects,
            vec![EditorEffect::SelectElement { id: Some(id.clone()) }]
        );
        assert_eq!(editor.gesture(), &Gesture::Idle);

        // Typing Delete into the control does not delete the element.
        assert!(editor
            .handle_event(&page, Some(&id), &InputEvent::key("Delete"))
            .is_empty());
    }

    #[test]
    fn test_malformed_layout_mounts_nothing() {
        let page = Page {
            layout: "nope".into(),
            ..Page::default()
        };
        let mut editor = Editor::new(GridMetrics::A4);
        assert!(editor.mount(&page).is_err());
        assert!(editor.surface().is_empty());
    }
}
