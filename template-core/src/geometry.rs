//! Geometry and constraint engine.
//!
//! Pure functions that keep elements inside their container while they are
//! dragged or resized. All element geometry is container-relative; container
//! bounds are expressed relative to the page origin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum element width in pixels.
pub const MIN_ELEMENT_WIDTH: f32 = 50.0;

/// Minimum element height in pixels.
pub const MIN_ELEMENT_HEIGHT: f32 = 30.0;

/// A point in page or container space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn delta_from(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

/// Container-relative position and size of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// X offset from the container's left edge.
    pub x: f32,
    /// Y offset from the container's top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Geometry {
    /// Create a geometry value.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The element's size.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Whether the geometry lies fully inside a container of the given bounds
    /// and respects the minimum element size.
    #[must_use]
    pub fn fits_within(&self, bounds: &ContainerBounds) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= MIN_ELEMENT_WIDTH
            && self.height >= MIN_ELEMENT_HEIGHT
            && self.x + self.width <= bounds.width
            && self.y + self.height <= bounds.height
    }

    /// Whether a container-relative point falls inside the element.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Bounds of a mounted container relative to the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerBounds {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Right edge (`left + width`).
    pub right: f32,
    /// Bottom edge (`top + height`).
    pub bottom: f32,
}

impl ContainerBounds {
    /// Build bounds from an origin and a size.
    #[must_use]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            right: left + width,
            bottom: top + height,
        }
    }

    /// Whether a page-space point lies inside the container.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    /// Convert a page-space point into container-relative coordinates.
    #[must_use]
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(point.x - self.left, point.y - self.top)
    }
}

/// One of the eight resize handles drawn around a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
    /// Middle of the top edge.
    TopCenter,
    /// Middle of the bottom edge.
    BottomCenter,
    /// Middle of the left edge.
    LeftCenter,
    /// Middle of the right edge.
    RightCenter,
}

impl ResizeHandle {
    /// All handles, in drawing order.
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::TopCenter,
        Self::BottomCenter,
        Self::LeftCenter,
        Self::RightCenter,
    ];

    /// The handle's token as used in serialized gestures.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::TopCenter => "top-center",
            Self::BottomCenter => "bottom-center",
            Self::LeftCenter => "left-center",
            Self::RightCenter => "right-center",
        }
    }

    /// Whether dragging this handle moves the left edge.
    #[must_use]
    pub const fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft | Self::LeftCenter)
    }

    /// Whether dragging this handle moves the right edge.
    #[must_use]
    pub const fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight | Self::RightCenter)
    }

    /// Whether dragging this handle moves the top edge.
    #[must_use]
    pub const fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::TopCenter)
    }

    /// Whether dragging this handle moves the bottom edge.
    #[must_use]
    pub const fn moves_bottom(self) -> bool {
        matches!(
            self,
            Self::BottomLeft | Self::BottomRight | Self::BottomCenter
        )
    }

    /// Anchor of the handle on an element box of the given size, relative to
    /// the element's top-left corner.
    #[must_use]
    pub fn anchor(self, size: Size) -> Point {
        let x = if self.moves_left() {
            0.0
        } else if self.moves_right() {
            size.width
        } else {
            size.width / 2.0
        };
        let y = if self.moves_top() {
            0.0
        } else if self.moves_bottom() {
            size.height
        } else {
            size.height / 2.0
        };
        Point::new(x, y)
    }
}

impl fmt::Display for ResizeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeHandle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| format!("Unknown resize handle: {s}"))
    }
}

/// Clamp a drag so the element stays inside its container.
///
/// `origin` is the proposed page-space position of the element's top-left
/// corner (pointer position minus the grab offset). Returns the clamped
/// container-relative position.
#[must_use]
pub fn clamp_drag(origin: Point, size: Size, bounds: &ContainerBounds) -> Point {
    let x = origin
        .x
        .max(bounds.left)
        .min(bounds.left + bounds.width - size.width);
    let y = origin
        .y
        .max(bounds.top)
        .min(bounds.top + bounds.height - size.height);

    Point::new((x - bounds.left).max(0.0), (y - bounds.top).max(0.0))
}

/// Clamp a resize gesture against the minimum size and the container.
///
/// The size is resolved first (minimum size wins), then the position is
/// pulled back so `position + size` never exceeds the container.
#[must_use]
pub fn clamp_resize(
    handle: ResizeHandle,
    start: Geometry,
    delta: Point,
    bounds: &ContainerBounds,
) -> Geometry {
    let mut width = start.width;
    let mut height = start.height;
    let mut x = start.x;
    let mut y = start.y;

    if handle.moves_right() {
        width = (start.width + delta.x).max(MIN_ELEMENT_WIDTH);
        width = width.min(bounds.width - x);
    }
    if handle.moves_bottom() {
        height = (start.height + delta.y).max(MIN_ELEMENT_HEIGHT);
        height = height.min(bounds.height - y);
    }
    if handle.moves_left() {
        width = (start.width - delta.x).max(MIN_ELEMENT_WIDTH);
        x = start.x + delta.x;
        if x < 0.0 {
            width += x;
            x = 0.0;
        }
    }
    if handle.moves_top() {
        height = (start.height - delta.y).max(MIN_ELEMENT_HEIGHT);
        y = start.y + delta.y;
        if y < 0.0 {
            height += y;
            y = 0.0;
        }
    }

    let width = width.max(MIN_ELEMENT_WIDTH);
    let height = height.max(MIN_ELEMENT_HEIGHT);
    // A container narrower than the minimum size cannot hold the element;
    // the position then settles at the origin.
    let x = x.max(0.0).min(bounds.width - width).max(0.0);
    let y = y.max(0.0).min(bounds.height - height).max(0.0);

    Geometry::new(x, y, width, height)
}
