//! Per-frame surface painting.
//!
//! Every surface with pending damage is repainted in full each tick, either
//! by the default z-ordered pass or by a custom [`Compositor`].

use crate::draw::DrawContext;
use crate::error::{DrawCallbackError, DrawError};
use crate::registry::{PrimitiveId, PrimitiveRecord, Registry, Surface};
use crate::util::{BoundingBox, Size};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What to do when a primitive's draw callback fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DrawErrorPolicy {
    /// Stop painting the surface for the current tick.
    #[default]
    AbortSurface,
    /// Log the failure and continue with the next primitive.
    SkipPrimitive,
}

/// Everything a compositor gets for one surface and one tick.
pub struct CompositeFrame<'a> {
    /// Primitives in registration order.
    pub primitives: &'a [&'a PrimitiveRecord],
    /// Damage accumulated since the last paint.
    pub dirty_regions: &'a [BoundingBox],
    pub surface_opacity: f64,
    pub size: Size,
    pub context: &'a mut DrawContext,
    pub(crate) policy: DrawErrorPolicy,
    pub(crate) errors: Vec<(PrimitiveId, DrawError)>,
}

impl<'a> CompositeFrame<'a> {
    /// Runs the default pass: clear, then paint all primitives by zIndex.
    ///
    /// Under [`DrawErrorPolicy::SkipPrimitive`] individual failures are
    /// collected and reported by the loop; otherwise the first failure is
    /// returned.
    pub fn draw_all(&mut self) -> Result<(), DrawError> {
        self.context.clear()?;
        let failures = paint_primitives(
            self.context,
            self.primitives,
            self.surface_opacity,
            self.policy,
        )
        .map_err(|(_, err)| err)?;
        self.errors.extend(failures);
        Ok(())
    }
}

/// Replaces the default pass for a surface.
///
/// The surface is not cleared beforehand; call
/// [`CompositeFrame::draw_all`] to fall back to the default behavior.
pub trait Compositor {
    fn composite(&mut self, frame: &mut CompositeFrame<'_>) -> Result<(), DrawError>;
}

impl<F> Compositor for F
where
    F: FnMut(&mut CompositeFrame<'_>) -> Result<(), DrawError>,
{
    fn composite(&mut self, frame: &mut CompositeFrame<'_>) -> Result<(), DrawError> {
        self(frame)
    }
}

/// Outcome of one tick.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Surfaces painted this tick, in registration order.
    pub painted: Vec<String>,
    pub errors: Vec<DrawCallbackError>,
}

impl FrameReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Paints `primitives` in ascending zIndex, ties in the given order.
///
/// Each primitive runs inside its own save/restore with alpha set to
/// `surface_opacity * opacity`. Returns the failures that were skipped, or
/// the first failure under [`DrawErrorPolicy::AbortSurface`].
fn paint_primitives(
    ctx: &mut DrawContext,
    primitives: &[&PrimitiveRecord],
    surface_opacity: f64,
    policy: DrawErrorPolicy,
) -> Result<Vec<(PrimitiveId, DrawError)>, (PrimitiveId, DrawError)> {
    let mut ordered: Vec<&PrimitiveRecord> = primitives.to_vec();
    ordered.sort_by_key(|record| record.params.z_index);

    let mut skipped = Vec::new();
    for record in ordered {
        if let Err(err) = paint_one(ctx, record, surface_opacity) {
            match policy {
                DrawErrorPolicy::AbortSurface => return Err((record.id, err)),
                DrawErrorPolicy::SkipPrimitive => {
                    warn!("Skipping primitive {:?}: {}", record.id, err);
                    skipped.push((record.id, err));
                }
            }
        }
    }
    Ok(skipped)
}

fn paint_one(
    ctx: &mut DrawContext,
    record: &PrimitiveRecord,
    surface_opacity: f64,
) -> Result<(), DrawError> {
    let depth = ctx.save_depth();
    ctx.save()?;
    ctx.set_global_alpha(surface_opacity * record.params.opacity);
    (record.transform)(ctx);
    let drawn = (record.draw)(ctx);
    let leaked = ctx.save_depth().saturating_sub(depth + 1);
    if leaked > 0 {
        warn!(
            "Primitive {:?} left {} unbalanced save(s); restoring",
            record.id, leaked
        );
    }
    restore_to(ctx, depth)?;
    drawn
}

/// Repaints every dirty surface and clears its damage.
///
/// Damage is cleared whether or not painting succeeded.
pub fn paint_dirty_surfaces(
    registry: &mut Registry,
    policy: DrawErrorPolicy,
    frame_index: u64,
) -> FrameReport {
    let mut report = FrameReport {
        frame_index,
        ..FrameReport::default()
    };

    for surface in registry.surfaces_mut() {
        if !surface.is_dirty() {
            continue;
        }
        let errors = paint_surface(surface, policy);
        surface.handle.flush();
        debug!(
            "Frame {}: painted '{}' ({} primitives)",
            frame_index,
            surface.name,
            surface.primitive_count()
        );
        report.painted.push(surface.name.clone());
        report.errors.extend(errors);
    }

    report
}

fn paint_surface(surface: &mut Surface, policy: DrawErrorPolicy) -> Vec<DrawCallbackError> {
    let size = surface.size();
    let regions = surface.dirty.take_regions(size);

    let mut slots: Vec<_> = surface.primitives.values().collect();
    slots.sort_by_key(|slot| slot.seq);
    let primitives: Vec<&PrimitiveRecord> = slots.into_iter().map(|slot| &slot.record).collect();

    let attribute = |primitive: Option<PrimitiveId>, source: DrawError| DrawCallbackError {
        surface: surface.name.clone(),
        primitive,
        source,
    };

    let context = &mut surface.context;
    let opacity = surface.opacity;

    let outcome = match surface.compositor.as_mut() {
        Some(compositor) => {
            let mut frame = CompositeFrame {
                primitives: &primitives,
                dirty_regions: &regions,
                surface_opacity: opacity,
                size,
                context,
                policy,
                errors: Vec::new(),
            };
            let result = compositor.composite(&mut frame);
            let skipped = std::mem::take(&mut frame.errors);
            let leaked = frame.context.save_depth();
            if leaked > 0 {
                warn!("Compositor left {} unbalanced save(s); restoring", leaked);
            }
            let restored = restore_to(frame.context, 0).map_err(|err| (None, DrawError::from(err)));
            result
                .map_err(|err| (None, err))
                .and_then(|()| restored)
                .map(|()| skipped)
        }
        None => clear_and_paint(context, &primitives, opacity, policy),
    };

    match outcome {
        Ok(skipped) => skipped
            .into_iter()
            .map(|(id, err)| attribute(Some(id), err))
            .collect(),
        Err((id, err)) => {
            let err = attribute(id, err);
            warn!("{}", err);
            vec![err]
        }
    }
}

fn clear_and_paint(
    ctx: &mut DrawContext,
    primitives: &[&PrimitiveRecord],
    surface_opacity: f64,
    policy: DrawErrorPolicy,
) -> Result<Vec<(PrimitiveId, DrawError)>, (Option<PrimitiveId>, DrawError)> {
    ctx.clear().map_err(|err| (None, err.into()))?;
    paint_primitives(ctx, primitives, surface_opacity, policy).map_err(|(id, err)| (Some(id), err))
}

/// Pops saved state until `ctx` is back at `depth`.
fn restore_to(ctx: &mut DrawContext, depth: usize) -> Result<(), cairo::Error> {
    while ctx.save_depth() > depth {
        ctx.restore()?;
    }
    Ok(())
}
