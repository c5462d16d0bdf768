//! Primitive records as stored by the registry.

use super::PrimitiveId;
use crate::draw::DrawContext;
use crate::error::DrawError;
use crate::util::BoundingBox;
use std::fmt;
use std::rc::Rc;

/// Paints one primitive. Runs with alpha and transform already applied.
pub type DrawFn = Rc<dyn Fn(&mut DrawContext) -> Result<(), DrawError>>;

/// Replays the primitive's accumulated transform onto the context.
pub type TransformFn = Rc<dyn Fn(&mut DrawContext)>;

/// Resolved per-primitive parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    /// Nominally `[0, 1]`; values outside are clamped only when painting.
    pub opacity: f64,
    pub z_index: i32,
    /// Bounds in the owning surface's logical coordinates.
    pub bbox: BoundingBox,
}

impl ShapeParams {
    pub fn new(opacity: f64, z_index: i32, bbox: BoundingBox) -> Self {
        Self {
            opacity,
            z_index,
            bbox,
        }
    }
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            z_index: 0,
            bbox: BoundingBox::default(),
        }
    }
}

/// Everything the registry needs to know about one declared primitive.
///
/// Records are replaced wholesale whenever any input changes.
#[derive(Clone)]
pub struct PrimitiveRecord {
    pub id: PrimitiveId,
    pub surface: String,
    pub draw: DrawFn,
    pub transform: TransformFn,
    pub params: ShapeParams,
}

impl PrimitiveRecord {
    /// Builds a record with an identity transform.
    pub fn new(
        id: PrimitiveId,
        surface: impl Into<String>,
        params: ShapeParams,
        draw: impl Fn(&mut DrawContext) -> Result<(), DrawError> + 'static,
    ) -> Self {
        Self {
            id,
            surface: surface.into(),
            draw: Rc::new(draw),
            transform: Rc::new(|_| {}),
            params,
        }
    }

    /// Replaces the transform callback.
    pub fn with_transform(mut self, transform: impl Fn(&mut DrawContext) + 'static) -> Self {
        self.transform = Rc::new(transform);
        self
    }

    /// Same record retargeted to another surface.
    pub fn on_surface(mut self, surface: impl Into<String>) -> Self {
        self.surface = surface.into();
        self
    }
}

impl fmt::Debug for PrimitiveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveRecord")
            .field("id", &self.id)
            .field("surface", &self.surface)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
