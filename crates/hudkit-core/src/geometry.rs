#![forbid(unsafe_code)]

//! Geometric primitives in viewport pixel space.
//!
//! All coordinates are `f64` screen pixels with the origin at the top-left
//! corner of the overlay. [`Rect`] carries its `right`/`bottom` edges
//! denormalized so edge comparisons during snapping stay cheap; the
//! constructors are the only way to build one, which keeps the derived edges
//! consistent.

use serde::{Deserialize, Serialize};

/// A point in viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The viewport origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by a delta.
    #[inline]
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Both coordinates are finite numbers.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Chebyshev distance: the larger of the two axis distances.
    #[inline]
    #[must_use]
    pub fn max_axis_distance(self, other: Point) -> f64 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Width and height of a measured element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// An element that has not been measured yet.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Scale both dimensions uniformly.
    #[inline]
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// Axis-aligned rectangle in viewport space.
///
/// `right == x + width` and `bottom == y + height` always hold for values
/// built through the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RectParts", into = "RectParts")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Serialize, Deserialize)]
struct RectParts {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl From<RectParts> for Rect {
    fn from(parts: RectParts) -> Self {
        Rect::new(parts.x, parts.y, parts.width, parts.height)
    }
}

impl From<Rect> for RectParts {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            right: x + width,
            bottom: y + height,
        }
    }

    /// Create a rectangle from an origin and a size.
    #[inline]
    #[must_use]
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Left edge (alias for x).
    #[inline]
    #[must_use]
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    #[must_use]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    #[inline]
    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Same size, different origin.
    #[inline]
    #[must_use]
    pub fn with_origin(&self, origin: Point) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }

    /// Translate by a delta.
    #[inline]
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Open-interval overlap test.
    ///
    /// Rectangles that merely share an edge do not intersect.
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right
            && self.right > other.left()
            && self.top() < other.bottom
            && self.bottom > other.top()
    }

    /// Check if a point is inside the rectangle (right/bottom exclusive).
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right && point.y >= self.y && point.y < self.bottom
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right.max(other.right);
        let bottom = self.bottom.max(other.bottom);
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Normalized rectangle spanning two corner points in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Rect {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Rect::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Bounding box of a set of rectangles, `None` when empty.
    #[must_use]
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects.into_iter().fold(None, |acc, rect| match acc {
            None => Some(*rect),
            Some(bounds) => Some(bounds.union(rect)),
        })
    }
}

/// The available screen area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The viewport as a rectangle anchored at the origin.
    #[inline]
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Clamp a point into `[0, width] x [0, height]`.
    ///
    /// Non-finite coordinates collapse to zero.
    #[must_use]
    pub fn clamp_point(&self, point: Point) -> Point {
        Point::new(
            clamp_axis(point.x, self.width.max(0.0)),
            clamp_axis(point.y, self.height.max(0.0)),
        )
    }

    /// Clamp the origin of an element of `size` so the element stays on
    /// screen. An element larger than the viewport is pinned to the
    /// top-left edge.
    #[must_use]
    pub fn clamp_origin(&self, origin: Point, size: Size) -> Point {
        let max_x = (self.width - size.width.max(0.0)).max(0.0);
        let max_y = (self.height - size.height.max(0.0)).max(0.0);
        let clamped = Point::new(clamp_axis(origin.x, max_x), clamp_axis(origin.y, max_y));
        self.clamp_point(clamped)
    }

    /// Offset that moves `bounds` back inside the viewport as one unit.
    ///
    /// Returns `(0, 0)` when already inside. When the bounds are larger than
    /// the viewport on an axis, the leading edge is aligned to zero.
    #[must_use]
    pub fn containment_offset(&self, bounds: &Rect) -> Point {
        Point::new(
            axis_offset(bounds.left(), bounds.right, self.width),
            axis_offset(bounds.top(), bounds.bottom, self.height),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

fn axis_offset(start: f64, end: f64, extent: f64) -> f64 {
    if start < 0.0 || end - start > extent {
        -start
    } else if end > extent {
        extent - end
    } else {
        0.0
    }
}
