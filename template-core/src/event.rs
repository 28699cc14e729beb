//! Input events for the interactive editor.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, ResizeHandle};
use crate::ElementId;

/// What a pointer landed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HitTarget {
    /// One of the eight resize handles of an element.
    ResizeHandle {
        /// Element owning the handle.
        element: ElementId,
        /// Which handle.
        handle: ResizeHandle,
    },
    /// The body of an element.
    ElementBody {
        /// The element.
        element: ElementId,
    },
    /// An editable control inside an element (text area, cell input, ...).
    EditableControl {
        /// Element owning the control.
        element: ElementId,
    },
    /// The background of a container.
    Container {
        /// Cell name.
        name: String,
    },
    /// The page background between containers.
    PageBackground,
    /// Outside the page.
    Outside,
}

impl HitTarget {
    /// The element this target belongs to, if any.
    #[must_use]
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::ResizeHandle { element, .. }
            | Self::ElementBody { element }
            | Self::EditableControl { element } => Some(element),
            Self::Container { .. } | Self::PageBackground | Self::Outside => None,
        }
    }
}

/// All input events the editor can receive.
///
/// Positions are page-space: relative to the page origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Primary button pressed.
    PointerDown {
        /// Pointer position.
        position: Point,
        /// Resolved target; hit-tested against the surface when absent.
        #[serde(default)]
        target: Option<HitTarget>,
    },
    /// Pointer moved.
    PointerMove {
        /// Pointer position.
        position: Point,
    },
    /// Primary button released.
    PointerUp,
    /// Pointer left the canvas.
    PointerLeave,
    /// Key pressed.
    Key {
        /// Key name, e.g. `"Delete"`.
        key: String,
        /// Active modifier keys.
        #[serde(default)]
        modifiers: KeyModifiers,
    },
}

impl InputEvent {
    /// Pointer press at a position, target resolved by hit testing.
    #[must_use]
    pub const fn pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown {
            position: Point::new(x, y),
            target: None,
        }
    }

    /// Pointer press on a known target.
    #[must_use]
    pub const fn pointer_down_on(x: f32, y: f32, target: HitTarget) -> Self {
        Self::PointerDown {
            position: Point::new(x, y),
            target: Some(target),
        }
    }

    /// Pointer move.
    #[must_use]
    pub const fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            position: Point::new(x, y),
        }
    }

    /// Key press without modifiers.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            modifiers: KeyModifiers::default(),
        }
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}
