//! Geometry helpers shared by the registry, the scene layer and the shapes.
//!
//! This module provides:
//! - [`BoundingBox`]: axis-aligned rectangle used for invalidation
//! - [`Point`] and [`Size`] value types
//! - Bounds folding over point sets

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Points and Sizes
// ============================================================================

/// A 2D point in surface or local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Logical size of a drawing surface, in CSS-like pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the backing pixel dimensions for the given device scale factor.
    ///
    /// Each axis is rounded up so a fractional scale never truncates the
    /// last row or column, and is at least one pixel.
    pub fn device_pixels(&self, scale: f64) -> (i32, i32) {
        let w = (self.width as f64 * scale).ceil().max(1.0);
        let h = (self.height as f64 * scale).ceil().max(1.0);
        (w.min(i32::MAX as f64) as i32, h.min(i32::MAX as f64) as i32)
    }
}

// ============================================================================
// Bounding Boxes
// ============================================================================

/// Axis-aligned rectangle used for dirty region tracking.
///
/// Width and height are never negative; a zero-area box is still a valid
/// invalidation (it marks the owning surface dirty without covering pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Creates a new box, normalizing negative extents so width/height stay non-negative.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let (x, width) = if width < 0.0 {
            (x + width, -width)
        } else {
            (x, width)
        };
        let (y, height) = if height < 0.0 {
            (y + height, -height)
        } else {
            (y, height)
        };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box covering an entire surface of the given logical size.
    pub fn full(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width as f64, size.height as f64)
    }

    /// Builds a box from min/max bounds.
    pub fn from_min_max(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.max_x(), self.y),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.x, self.max_y()),
        ]
    }

    /// Returns true if the box covers no area.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns the smallest box covering both inputs.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_min_max(
            self.x.min(other.x),
            self.y.min(other.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Strict overlap test; boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.max_x()
            && self.max_x() > other.x
            && self.y < other.max_y()
            && self.max_y() > other.y
    }

    /// Grows the box evenly in all directions by `amount`.
    pub fn inflate(&self, amount: f64) -> BoundingBox {
        BoundingBox::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

/// Folds a point set into its bounding box. Returns `None` for an empty set.
pub fn bounds_of_points(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox::from_min_max(min_x, min_y, max_x, max_y))
}
