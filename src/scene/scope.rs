//! Declaration scopes: the inherited state a primitive is declared under.
//!
//! A scope is an immutable snapshot of the enclosing surface name, transform
//! list and group parameters. Nesting produces a new scope; the parent is
//! left untouched, so siblings never observe each other's state.

use super::bbox::transform_box;
use super::group::{GroupParams, GroupSpec};
use super::transform::{TransformList, TransformSpec, compose};
use crate::draw::DrawContext;
use crate::error::{DrawError, MissingRegistryError};
use crate::registry::{PrimitiveId, PrimitiveRecord, ShapeParams};
use std::rc::Rc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclareScope {
    surface: Option<String>,
    transforms: TransformList,
    group: GroupParams,
}

impl DeclareScope {
    /// Scope outside of any surface, transform or group.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn surface(&self) -> Option<&str> {
        self.surface.as_deref()
    }

    pub fn transforms(&self) -> &TransformList {
        &self.transforms
    }

    pub fn group(&self) -> GroupParams {
        self.group
    }

    /// Targets primitives at the named surface.
    pub fn within_surface(&self, name: impl Into<String>) -> Self {
        Self {
            surface: Some(name.into()),
            ..self.clone()
        }
    }

    /// Composes a transform node onto this scope.
    pub fn within_transform(&self, own: &TransformSpec) -> Self {
        let (_, transforms) = compose(own, &self.transforms.accumulate());
        Self {
            transforms,
            ..self.clone()
        }
    }

    /// Enters a group: nests its opacity/zIndex and translates by its offset.
    pub fn within_group(&self, spec: &GroupSpec) -> Self {
        let nested = Self {
            group: self.group.nest(spec.opacity, spec.z_index),
            ..self.clone()
        };
        nested.within_transform(&TransformSpec::translate(spec.x, spec.y))
    }

    /// Resolves a primitive declared in this scope into a registry record.
    ///
    /// `local` carries the primitive's own opacity, zIndex and local-space
    /// box. Fails when no surface encloses the declaration.
    pub fn declare(
        &self,
        id: PrimitiveId,
        local: ShapeParams,
        draw: impl Fn(&mut DrawContext) -> Result<(), DrawError> + 'static,
    ) -> Result<PrimitiveRecord, MissingRegistryError> {
        let surface = self
            .surface
            .clone()
            .ok_or(MissingRegistryError::NoSurfaceScope(id))?;

        let (opacity, z_index) = self.group.resolve(local.opacity, local.z_index);
        let bbox = transform_box(local.bbox, &self.transforms);
        let transforms = Rc::new(self.transforms.clone());

        Ok(
            PrimitiveRecord::new(id, surface, ShapeParams::new(opacity, z_index, bbox), draw)
                .with_transform(move |ctx| transforms.apply(ctx)),
        )
    }
}
