//! Named drawing surfaces and the pixel stores behind them.

use super::PrimitiveId;
use super::dirty::DirtyTracker;
use super::primitive::PrimitiveRecord;
use crate::draw::DrawContext;
use crate::render::Compositor;
use crate::util::{BoundingBox, Size};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// A pixel store the registry can draw into.
///
/// `acquire_context` is called exactly once per registration and once more
/// after every resize; the returned context stays bound to the surface until
/// the next resize or unregistration.
pub trait SurfaceHandle {
    /// Size in logical pixels.
    fn logical_size(&self) -> Size;

    /// Device pixels per logical pixel.
    fn scale_factor(&self) -> f64;

    /// Creates a drawing context targeting the current backing store.
    fn acquire_context(&mut self) -> Result<cairo::Context, cairo::Error>;

    /// Replaces the backing store with one of `size * scale` device pixels.
    /// Previous pixel content is discarded.
    fn resize(&mut self, size: Size) -> Result<(), cairo::Error>;

    /// Copies the current pixels into a standalone image.
    fn snapshot(&self) -> Result<cairo::ImageSurface, cairo::Error>;

    /// Called after a frame has been painted.
    fn flush(&self) {}
}

/// In-memory surface backed by a cairo ARGB32 image.
#[derive(Debug)]
pub struct ImageCanvas {
    size: Size,
    scale: f64,
    image: cairo::ImageSurface,
}

impl ImageCanvas {
    /// Creates a transparent canvas of `size` logical pixels.
    ///
    /// Non-finite or non-positive scale factors fall back to 1.0.
    pub fn new(size: Size, scale: f64) -> Result<Self, cairo::Error> {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let image = create_image(size, scale)?;
        Ok(Self { size, scale, image })
    }

    /// Backing image; pixel data can only be borrowed once no context is alive.
    pub fn image(&self) -> &cairo::ImageSurface {
        &self.image
    }

    /// Writes the current pixels to a PNG file.
    pub fn write_png(&self, path: &Path) -> anyhow::Result<()> {
        write_png(&self.snapshot()?, path)
    }
}

impl SurfaceHandle for ImageCanvas {
    fn logical_size(&self) -> Size {
        self.size
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn acquire_context(&mut self) -> Result<cairo::Context, cairo::Error> {
        cairo::Context::new(&self.image)
    }

    fn resize(&mut self, size: Size) -> Result<(), cairo::Error> {
        self.image = create_image(size, self.scale)?;
        self.size = size;
        Ok(())
    }

    fn snapshot(&self) -> Result<cairo::ImageSurface, cairo::Error> {
        copy_image(&self.image)
    }

    fn flush(&self) {
        self.image.flush();
    }
}

fn create_image(size: Size, scale: f64) -> Result<cairo::ImageSurface, cairo::Error> {
    let (width, height) = size.device_pixels(scale);
    cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)
}

/// Copies `image` into a fresh surface that shares no references.
pub fn copy_image(image: &cairo::ImageSurface) -> Result<cairo::ImageSurface, cairo::Error> {
    let copy = cairo::ImageSurface::create(cairo::Format::ARgb32, image.width(), image.height())?;
    {
        let cr = cairo::Context::new(&copy)?;
        cr.set_operator(cairo::Operator::Source);
        cr.set_source_surface(image, 0.0, 0.0)?;
        cr.paint()?;
    }
    copy.flush();
    Ok(copy)
}

/// Encodes `image` as PNG at `path`.
pub fn write_png(image: &cairo::ImageSurface, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context as _;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    image
        .write_to_png(&mut file)
        .with_context(|| format!("Failed to encode PNG {}", path.display()))?;
    Ok(())
}

#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) seq: u64,
    pub(crate) record: PrimitiveRecord,
}

/// A registered surface: its pixel store, drawing context and primitives.
pub struct Surface {
    pub(crate) name: String,
    pub(crate) handle: Box<dyn SurfaceHandle>,
    pub(crate) context: DrawContext,
    pub(crate) opacity: f64,
    pub(crate) z_index: i32,
    pub(crate) compositor: Option<Box<dyn Compositor>>,
    pub(crate) primitives: HashMap<PrimitiveId, Slot>,
    pub(crate) next_seq: u64,
    pub(crate) dirty: DirtyTracker,
}

impl Surface {
    pub(crate) fn new(
        name: String,
        handle: Box<dyn SurfaceHandle>,
        context: DrawContext,
        opacity: f64,
        z_index: i32,
        compositor: Option<Box<dyn Compositor>>,
    ) -> Self {
        let mut dirty = DirtyTracker::new();
        dirty.mark_full();
        Self {
            name,
            handle,
            context,
            opacity,
            z_index,
            compositor,
            primitives: HashMap::new(),
            next_seq: 0,
            dirty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Stacking order used when surfaces are flattened together.
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn size(&self) -> Size {
        self.handle.logical_size()
    }

    pub fn scale_factor(&self) -> f64 {
        self.handle.scale_factor()
    }

    pub fn has_compositor(&self) -> bool {
        self.compositor.is_some()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.primitives.contains_key(&id)
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&PrimitiveRecord> {
        self.primitives.get(&id).map(|slot| &slot.record)
    }

    /// Primitives in first-registration order.
    pub fn primitives(&self) -> Vec<&PrimitiveRecord> {
        let mut slots: Vec<&Slot> = self.primitives.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.record).collect()
    }

    /// Returns true when the next tick will repaint this surface.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Damage recorded since the last paint.
    pub fn pending_regions(&self) -> Vec<BoundingBox> {
        self.dirty.regions(self.size())
    }

    /// Copies the surface pixels.
    pub fn snapshot(&self) -> Result<cairo::ImageSurface, cairo::Error> {
        self.handle.snapshot()
    }

    /// Inserts or replaces a primitive, returning the replaced record.
    ///
    /// A replaced primitive keeps its original registration position.
    pub(crate) fn insert(&mut self, record: PrimitiveRecord) -> Option<PrimitiveRecord> {
        match self.primitives.get_mut(&record.id) {
            Some(slot) => Some(std::mem::replace(&mut slot.record, record)),
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.primitives.insert(record.id, Slot { seq, record });
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, id: PrimitiveId) -> Option<PrimitiveRecord> {
        self.primitives.remove(&id).map(|slot| slot.record)
    }

    pub(crate) fn mark_dirty(&mut self, bbox: BoundingBox) {
        self.dirty.mark_rect(bbox);
    }

    pub(crate) fn mark_full(&mut self) {
        self.dirty.mark_full();
    }

    /// Recreates the backing store and context, then marks the surface fully dirty.
    ///
    /// Once the store has been replaced the surface stays fully dirty even if
    /// a fresh context cannot be acquired.
    pub(crate) fn resize(&mut self, size: Size) -> Result<(), cairo::Error> {
        self.handle.resize(size)?;
        self.dirty.mark_full();
        let cr = self.handle.acquire_context()?;
        self.context = DrawContext::new(cr);
        self.context.reset(self.handle.scale_factor());
        debug!(
            "Resized surface '{}' to {}x{} (scale {})",
            self.name,
            size.width,
            size.height,
            self.handle.scale_factor()
        );
        Ok(())
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("name", &self.name)
            .field("size", &self.size())
            .field("opacity", &self.opacity)
            .field("z_index", &self.z_index)
            .field("custom_compositor", &self.compositor.is_some())
            .field("primitives", &self.primitives.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_uses_device_pixels() {
        let canvas = ImageCanvas::new(Size::new(10, 4), 2.0).unwrap();
        assert_eq!(canvas.image().width(), 20);
        assert_eq!(canvas.image().height(), 8);
    }

    #[test]
    fn resize_discards_pixels() {
        let mut canvas = ImageCanvas::new(Size::new(4, 4), 1.0).unwrap();
        {
            let cr = canvas.acquire_context().unwrap();
            cr.set_source_rgb(1.0, 0.0, 0.0);
            cr.paint().unwrap();
        }
        canvas.resize(Size::new(6, 6)).unwrap();
        let mut snapshot = canvas.snapshot().unwrap();
        assert_eq!(snapshot.width(), 6);
        assert!(snapshot.data().unwrap().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn snapshot_works_while_context_alive() {
        let mut canvas = ImageCanvas::new(Size::new(2, 2), 1.0).unwrap();
        let cr = canvas.acquire_context().unwrap();
        cr.set_source_rgb(0.0, 0.0, 1.0);
        cr.paint().unwrap();
        let mut snapshot = canvas.snapshot().unwrap();
        assert!(snapshot.data().unwrap().iter().any(|byte| *byte != 0));
        drop(cr);
    }
}
