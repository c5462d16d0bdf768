//! Dirty region tracking per surface.
//!
//! Collects the bounding boxes that changed between frames. Any recorded
//! region, including a zero-area one, makes the surface due for a repaint.

use crate::util::{BoundingBox, Size};

/// Tracks dirty rectangles accumulated between renders.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    regions: Vec<BoundingBox>,
    force_full: bool,
}

impl DirtyTracker {
    /// Creates a new, empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the entire surface as dirty. Clears any accumulated rectangles.
    pub fn mark_full(&mut self) {
        self.force_full = true;
        self.regions.clear();
    }

    /// Adds a dirty rectangle if the tracker is not already full.
    pub fn mark_rect(&mut self, rect: BoundingBox) {
        if self.force_full {
            return;
        }
        self.regions.push(rect);
    }

    /// Returns true when a repaint is owed.
    pub fn is_dirty(&self) -> bool {
        self.force_full || !self.regions.is_empty()
    }

    /// Returns the pending regions without draining them.
    pub fn regions(&self, size: Size) -> Vec<BoundingBox> {
        if self.force_full {
            vec![BoundingBox::full(size)]
        } else {
            self.regions.clone()
        }
    }

    /// Drains the dirty regions gathered so far.
    ///
    /// When the full surface is marked, returns a single rectangle covering the
    /// entire surface; otherwise returns accumulated rectangles.
    pub fn take_regions(&mut self, size: Size) -> Vec<BoundingBox> {
        if self.force_full {
            self.force_full = false;
            self.regions.clear();
            vec![BoundingBox::full(size)]
        } else {
            self.regions.drain(..).collect()
        }
    }
}
