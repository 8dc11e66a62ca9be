//! Geometry primitives shared by every editor component.
//!
//! # Coordinate System
//!
//! - All rectangles are measured in native image pixels
//! - Origin is the top-left corner, x grows right, y grows down
//! - Values are `f64` so drag math never accumulates rounding error;
//!   rounding to whole pixels happens only at export time

use serde::{Deserialize, Serialize};

/// A point in some 2D pixel frame (client, container or image space).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of an image in native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The full-image rectangle `(0, 0, width, height)`.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// Axis-aligned rectangle in image pixel units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// All four components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Width over height. Only meaningful for non-degenerate rectangles.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Move the rectangle by `(dx, dy)` without resizing it.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// A rectangle of `fraction` times the bounds' size, centered inside them.
    pub fn centered_in(bounds: &Rect, fraction: f64) -> Self {
        let width = bounds.width * fraction;
        let height = bounds.height * fraction;
        Self::new(
            bounds.x + (bounds.width - width) / 2.0,
            bounds.y + (bounds.height - height) / 2.0,
            width,
            height,
        )
    }

    /// Check if the point lies inside the rectangle (right/bottom edges exclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Check if the two rectangles share any area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Clamp into `bounds`, keeping at least `min_size` on each axis.
    ///
    /// Size is reduced first (to at most the bounds' size), then the
    /// rectangle is shifted back inside. Negative sizes are normalized
    /// so the result never inverts.
    pub fn clamp_within(&self, bounds: &Rect, min_size: f64) -> Self {
        let (x, width) = clamp_span(self.x, self.width, bounds.x, bounds.width, min_size);
        let (y, height) = clamp_span(self.y, self.height, bounds.y, bounds.height, min_size);
        Self::new(x, y, width, height)
    }
}

/// Clamp a 1D span `[start, start + len)` into `[lo, lo + extent)`.
fn clamp_span(start: f64, len: f64, lo: f64, extent: f64, min_size: f64) -> (f64, f64) {
    let (start, len) = if len < 0.0 {
        (start + len, -len)
    } else {
        (start, len)
    };
    let len = len.max(min_size).min(extent.max(min_size));
    let hi = lo + extent;
    let start = start.min(hi - len).max(lo);
    (start, len)
}
