//! Property tests for the geometry engine, layout resolver and editor.

use proptest::prelude::*;

use template_core::{
    clamp_drag, clamp_resize, ContainerBounds, Editor, EditorEffect, Element, ElementType,
    Geometry, GridMetrics, InputEvent, LayoutDescriptor, Page, Point, ResizeHandle, Size,
    MIN_ELEMENT_HEIGHT, MIN_ELEMENT_WIDTH,
};

fn arb_handle() -> impl Strategy<Value = ResizeHandle> {
    prop::sample::select(ResizeHandle::ALL.to_vec())
}

/// A container at least the minimum element size and a geometry inside it.
/// Whole-pixel values keep the arithmetic exact.
fn arb_container_and_geometry() -> impl Strategy<Value = (ContainerBounds, Geometry)> {
    (50u16..1000, 30u16..1000).prop_flat_map(|(w, h)| {
        (
            Just((w, h)),
            50u16..=w,
            30u16..=h,
        )
            .prop_flat_map(|((w, h), ew, eh)| {
                (Just((w, h, ew, eh)), 0u16..=(w - ew), 0u16..=(h - eh))
            })
            .prop_map(|((w, h, ew, eh), x, y)| {
                (
                    ContainerBounds::new(16.0, 16.0, f32::from(w), f32::from(h)),
                    Geometry::new(f32::from(x), f32::from(y), f32::from(ew), f32::from(eh)),
                )
            })
    })
}

proptest! {
    #[test]
    fn prop_resize_keeps_element_inside(
        (bounds, start) in arb_container_and_geometry(),
        handle in arb_handle(),
        dx in -2000i16..2000,
        dy in -2000i16..2000,
    ) {
        let result = clamp_resize(handle, start, Point::new(f32::from(dx), f32::from(dy)), &bounds);
        prop_assert!(result.width >= MIN_ELEMENT_WIDTH);
        prop_assert!(result.height >= MIN_ELEMENT_HEIGHT);
        prop_assert!(
            result.fits_within(&bounds),
            "{:?} escaped {:?} via {}",
            result, bounds, handle
        );
    }

    #[test]
    fn prop_drag_keeps_element_inside(
        (bounds, start) in arb_container_and_geometry(),
        px in -2000i16..2000,
        py in -2000i16..2000,
    ) {
        let size = start.size();
        let at = clamp_drag(Point::new(f32::from(px), f32::from(py)), size, &bounds);
        let moved = Geometry::new(at.x, at.y, size.width, size.height);
        prop_assert!(moved.fits_within(&bounds), "{:?} escaped {:?}", moved, bounds);
    }

    #[test]
    fn prop_containers_stay_on_page(
        rows in prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec!["A", "B", "C", "D"]), 1..4),
            1..4,
        )
    ) {
        let layout = LayoutDescriptor::new(rows);
        let boxes = layout.place_containers(&GridMetrics::A4);
        prop_assert_eq!(boxes.len(), layout.unique_cells().len());
        for placed in &boxes {
            prop_assert!(placed.bounds.left >= 0.0);
            prop_assert!(placed.bounds.right <= GridMetrics::A4.page_width + 0.01);
            prop_assert!(placed.bounds.height >= GridMetrics::A4.min_cell_height);
        }
    }
}

#[test]
fn test_container_smaller_than_minimum_clamps_to_origin() {
    let bounds = ContainerBounds::new(0.0, 0.0, 40.0, 20.0);
    let start = Geometry::new(5.0, 5.0, 60.0, 40.0);
    let result = clamp_resize(ResizeHandle::BottomRight, start, Point::new(10.0, 10.0), &bounds);
    assert_eq!(result.x, 0.0);
    assert_eq!(result.y, 0.0);
    assert_eq!(result.width, MIN_ELEMENT_WIDTH);
    assert_eq!(result.height, MIN_ELEMENT_HEIGHT);

    let at = clamp_drag(
        Point::new(30.0, 30.0),
        Size {
            width: 60.0,
            height: 40.0,
        },
        &bounds,
    );
    assert_eq!(at, Point::new(0.0, 0.0));
}

#[test]
fn test_drag_across_page_applies_to_model() {
    let mut page = Page::default();
    let id = page.add_element(Element::new(ElementType::Image, "B", None));
    if let Some(element) = page.element_mut(&id) {
        // A loaded image has no file input, so its whole body is a grab area.
        element.kind = template_core::ElementKind::Image(template_core::ImageData {
            src: "data:image/png;base64,AAAA".to_string(),
        });
    }

    let mut editor = Editor::new(GridMetrics::A4);
    editor.mount(&page).expect("mount");
    let b = editor.surface().container_bounds("B").expect("bounds");

    let grab = Point::new(b.left + 50.0, b.top + 50.0);
    let events = [
        InputEvent::pointer_down(grab.x, grab.y),
        InputEvent::pointer_move(2000.0, 2000.0),
        InputEvent::pointer_move(-500.0, b.top + 100.0),
        InputEvent::PointerUp,
    ];

    let mut active = None;
    for event in &events {
        for effect in editor.handle_event(&page, active.as_ref(), event) {
            match effect {
                EditorEffect::UpdateElement { id, patch } => {
                    page.update_element(&id, patch).expect("update");
                }
                EditorEffect::SelectElement { id } => active = id,
                other => panic!("unexpected effect {other:?}"),
            }
        }
    }

    let element = page.element(&id).expect("element");
    assert_eq!(element.x, 0.0);
    assert_eq!(element.y, 60.0);
    assert!(element.geometry().fits_within(&b));
}
