//! Surface and primitive registry.
//!
//! The registry is the authoritative store of named surfaces. Each surface
//! owns a keyed collection of primitives and the damage accumulated since its
//! last paint. Primitive ids are unique across the whole registry, so
//! re-declaring an id against another surface moves the primitive there.

mod dirty;
mod id;
mod primitive;
mod surface;

pub use dirty::DirtyTracker;
pub use id::{IdIssuer, PrimitiveId};
pub use primitive::{DrawFn, PrimitiveRecord, ShapeParams, TransformFn};
pub use surface::{ImageCanvas, Surface, SurfaceHandle, copy_image, write_png};

use crate::draw::DrawContext;
use crate::error::{MissingRegistryError, RegistrationError, RegistryError};
use crate::render::Compositor;
use crate::util::Size;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Optional settings for [`Registry::register_surface_with`].
pub struct SurfaceOptions {
    pub opacity: f64,
    pub z_index: i32,
    pub compositor: Option<Box<dyn Compositor>>,
}

impl SurfaceOptions {
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_compositor(mut self, compositor: impl Compositor + 'static) -> Self {
        self.compositor = Some(Box::new(compositor));
        self
    }
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            z_index: 0,
            compositor: None,
        }
    }
}

/// Authoritative store of surfaces and their primitives.
#[derive(Debug, Default)]
pub struct Registry {
    surfaces: Vec<Surface>,
    owners: HashMap<PrimitiveId, String>,
    ids: IdIssuer,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh primitive id.
    pub fn issue_id(&mut self) -> PrimitiveId {
        self.ids.issue()
    }

    /// Returns true if `id` is currently issued.
    pub fn is_live(&self, id: PrimitiveId) -> bool {
        self.ids.is_live(id)
    }

    /// Removes the primitive (if stored) and recycles its id.
    ///
    /// Returns `false` if the id was already stale.
    pub fn retire_id(&mut self, id: PrimitiveId) -> bool {
        self.remove_primitive(id);
        self.ids.retire(id)
    }

    /// Registers a surface with the given opacity and optional compositor.
    ///
    /// See [`register_surface_with`](Self::register_surface_with).
    pub fn register_surface(
        &mut self,
        name: impl Into<String>,
        handle: impl SurfaceHandle + 'static,
        opacity: f64,
        compositor: Option<Box<dyn Compositor>>,
    ) -> Result<bool, RegistrationError> {
        self.register_surface_with(
            name,
            handle,
            SurfaceOptions {
                opacity,
                compositor,
                ..SurfaceOptions::default()
            },
        )
    }

    /// Registers a surface under `name`.
    ///
    /// The first registration for a name wins: later calls leave the existing
    /// surface untouched and return `Ok(false)`. On success the surface is
    /// fully dirty. If no drawing context can be acquired nothing is created.
    pub fn register_surface_with(
        &mut self,
        name: impl Into<String>,
        handle: impl SurfaceHandle + 'static,
        options: SurfaceOptions,
    ) -> Result<bool, RegistrationError> {
        let name = name.into();
        if self.position(&name).is_some() {
            debug!("Surface '{}' already registered; ignoring", name);
            return Ok(false);
        }

        let mut handle: Box<dyn SurfaceHandle> = Box::new(handle);
        let cr = handle
            .acquire_context()
            .map_err(|source| RegistrationError {
                name: name.clone(),
                source,
            })?;
        let mut context = DrawContext::new(cr);
        context.reset(handle.scale_factor());

        let size = handle.logical_size();
        info!(
            "Registered surface '{}' ({}x{} @ {}x, opacity {})",
            name,
            size.width,
            size.height,
            handle.scale_factor(),
            options.opacity
        );
        self.surfaces.push(Surface::new(
            name,
            handle,
            context,
            options.opacity,
            options.z_index,
            options.compositor,
        ));
        Ok(true)
    }

    /// Removes a surface with all of its primitives and pending damage.
    ///
    /// Ids of the discarded primitives stay issued. Returns `false` if no such
    /// surface existed.
    pub fn unregister_surface(&mut self, name: &str) -> bool {
        let Some(pos) = self.position(name) else {
            return false;
        };
        let surface = self.surfaces.remove(pos);
        self.owners.retain(|_, owner| owner != name);
        info!(
            "Unregistered surface '{}' ({} primitives dropped)",
            name,
            surface.primitive_count()
        );
        true
    }

    /// Inserts or replaces a primitive on the surface named by the record.
    ///
    /// Moving an id to another surface removes it from its previous surface
    /// and marks its old box dirty there. Replacing on the same surface marks
    /// both the old and the new box dirty.
    pub fn set_primitive(&mut self, record: PrimitiveRecord) -> Result<(), RegistryError> {
        let id = record.id;
        if !self.ids.is_live(id) {
            return Err(RegistryError::StaleId(id));
        }
        let Some(target) = self.position(&record.surface) else {
            return Err(MissingRegistryError::UnregisteredSurface {
                id,
                surface: record.surface,
            }
            .into());
        };

        if let Some(previous) = self.owners.get(&id).cloned() {
            if previous != record.surface {
                if let Some(pos) = self.position(&previous) {
                    let source = &mut self.surfaces[pos];
                    if let Some(old) = source.remove(id) {
                        source.mark_dirty(old.params.bbox);
                        debug!(
                            "Moved primitive {:?} from '{}' to '{}'",
                            id, previous, record.surface
                        );
                    }
                }
            }
        }

        let surface_name = record.surface.clone();
        let bbox = record.params.bbox;
        let target = &mut self.surfaces[target];
        if let Some(old) = target.insert(record) {
            target.mark_dirty(old.params.bbox);
        }
        target.mark_dirty(bbox);
        self.owners.insert(id, surface_name);
        Ok(())
    }

    /// Removes the primitive if it is stored under the record's surface.
    ///
    /// The stored box is marked dirty. Returns `false` (and does nothing)
    /// when the primitive is not present there.
    pub fn remove_shape(&mut self, record: &PrimitiveRecord) -> bool {
        let Some(pos) = self.position(&record.surface) else {
            return false;
        };
        let surface = &mut self.surfaces[pos];
        let Some(old) = surface.remove(record.id) else {
            return false;
        };
        surface.mark_dirty(old.params.bbox);
        self.owners.remove(&record.id);
        true
    }

    /// Removes a primitive from whichever surface currently holds it.
    pub fn remove_primitive(&mut self, id: PrimitiveId) -> bool {
        let Some(owner) = self.owners.remove(&id) else {
            return false;
        };
        let Some(pos) = self.position(&owner) else {
            return false;
        };
        let surface = &mut self.surfaces[pos];
        match surface.remove(id) {
            Some(old) => {
                surface.mark_dirty(old.params.bbox);
                true
            }
            None => false,
        }
    }

    /// Changes a surface's logical size.
    ///
    /// The backing store is recreated at `size * scale`, the context transform
    /// reset and the whole surface marked dirty.
    pub fn resize_surface(&mut self, name: &str, size: Size) -> Result<(), RegistryError> {
        let pos = self
            .position(name)
            .ok_or_else(|| RegistryError::UnknownSurface(name.to_string()))?;
        self.surfaces[pos]
            .resize(size)
            .map_err(|source| RegistryError::Resize {
                name: name.to_string(),
                source,
            })
    }

    /// Resizes every registered surface.
    ///
    /// All surfaces are attempted; the first failure is returned.
    pub fn resize_all(&mut self, size: Size) -> Result<(), RegistryError> {
        let mut first_error = None;
        for surface in &mut self.surfaces {
            if let Err(source) = surface.resize(size) {
                warn!("Failed to resize surface '{}': {}", surface.name, source);
                first_error.get_or_insert(RegistryError::Resize {
                    name: surface.name.clone(),
                    source,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Changes a surface's opacity and schedules a full repaint.
    pub fn set_surface_opacity(&mut self, name: &str, opacity: f64) -> Result<(), RegistryError> {
        let surface = self.surface_mut(name)?;
        if surface.opacity != opacity {
            surface.opacity = opacity;
            surface.mark_full();
        }
        Ok(())
    }

    /// Changes a surface's stacking order.
    pub fn set_surface_z_index(&mut self, name: &str, z_index: i32) -> Result<(), RegistryError> {
        self.surface_mut(name)?.z_index = z_index;
        Ok(())
    }

    /// Installs or removes a custom compositor and schedules a full repaint.
    pub fn set_compositor(
        &mut self,
        name: &str,
        compositor: Option<Box<dyn Compositor>>,
    ) -> Result<(), RegistryError> {
        let surface = self.surface_mut(name)?;
        surface.compositor = compositor;
        surface.mark_full();
        Ok(())
    }

    pub fn surface(&self, name: &str) -> Option<&Surface> {
        self.surfaces.iter().find(|surface| surface.name == name)
    }

    /// Surfaces in registration order.
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    pub fn surface_names(&self) -> Vec<&str> {
        self.surfaces.iter().map(|surface| surface.name()).collect()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Name of the surface currently holding `id`.
    pub fn owner_of(&self, id: PrimitiveId) -> Option<&str> {
        self.owners.get(&id).map(String::as_str)
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&PrimitiveRecord> {
        let owner = self.owners.get(&id)?;
        self.surface(owner)?.primitive(id)
    }

    /// Primitives of a surface in registration order; empty if unknown.
    pub fn primitives_on(&self, name: &str) -> Vec<&PrimitiveRecord> {
        self.surface(name)
            .map(Surface::primitives)
            .unwrap_or_default()
    }

    pub fn primitive_count(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if any surface is waiting to be repainted.
    pub fn has_pending_damage(&self) -> bool {
        self.surfaces.iter().any(Surface::is_dirty)
    }

    pub(crate) fn surfaces_mut(&mut self) -> &mut [Surface] {
        &mut self.surfaces
    }

    fn surface_mut(&mut self, name: &str) -> Result<&mut Surface, RegistryError> {
        self.surfaces
            .iter_mut()
            .find(|surface| surface.name == name)
            .ok_or_else(|| RegistryError::UnknownSurface(name.to_string()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.surfaces.iter().position(|surface| surface.name == name)
    }
}
