//! Hierarchical transform composition.
//!
//! Every transform node folds its own translate/scale/rotate into the
//! accumulation inherited from its parent and emits an ordered
//! `[translate, scale, rotate]` list carrying the *accumulated* values. That
//! list is what descendants inherit and what a primitive at that level
//! replays onto its drawing context. Pivots (`origin`) are never inherited:
//! only the nearest node's origin governs, while magnitudes always
//! accumulate.

use crate::draw::DrawContext;
use crate::util::Point;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Translation component of a transform node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Translate {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Scale component of a transform node, optionally pivoted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scale {
    #[serde(default = "one")]
    pub x: f64,
    #[serde(default = "one")]
    pub y: f64,
    #[serde(default)]
    pub origin: Option<Point>,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            origin: None,
        }
    }
}

/// Rotation component (radians) of a transform node, optionally pivoted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Rotate {
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub origin: Option<Point>,
}

fn one() -> f64 {
    1.0
}

/// A node's own transform; omitted components behave as identity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TransformSpec {
    #[serde(default)]
    pub translate: Option<Translate>,
    #[serde(default)]
    pub scale: Option<Scale>,
    #[serde(default)]
    pub rotate: Option<Rotate>,
}

impl TransformSpec {
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            translate: Some(Translate { x, y }),
            ..Self::default()
        }
    }

    pub fn scale(x: f64, y: f64) -> Self {
        Self {
            scale: Some(Scale {
                x,
                y,
                origin: None,
            }),
            ..Self::default()
        }
    }

    pub fn rotate(angle: f64) -> Self {
        Self {
            rotate: Some(Rotate {
                angle,
                origin: None,
            }),
            ..Self::default()
        }
    }
}

/// Running product of all ancestor transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatedTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
}

impl AccumulatedTransform {
    pub const IDENTITY: AccumulatedTransform = AccumulatedTransform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        angle: 0.0,
    };
}

impl Default for AccumulatedTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One entry of an ordered transform list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformStep {
    Translate { x: f64, y: f64 },
    Scale { x: f64, y: f64, origin: Option<Point> },
    Rotate { angle: f64, origin: Option<Point> },
}

/// Ordered transform list as produced by [`compose`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformList(Vec<TransformStep>);

impl TransformList {
    /// The empty list (no enclosing transform node).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_steps(steps: Vec<TransformStep>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds the list into an accumulation: translates and angles add,
    /// scales multiply.
    pub fn accumulate(&self) -> AccumulatedTransform {
        self.0
            .iter()
            .fold(AccumulatedTransform::IDENTITY, |mut acc, step| {
                match *step {
                    TransformStep::Translate { x, y } => {
                        acc.translate_x += x;
                        acc.translate_y += y;
                    }
                    TransformStep::Scale { x, y, .. } => {
                        acc.scale_x *= x;
                        acc.scale_y *= y;
                    }
                    TransformStep::Rotate { angle, .. } => acc.angle += angle,
                }
                acc
            })
    }

    /// Replays the list onto a drawing context.
    ///
    /// Pivoted scale/rotate steps are applied as `translate(origin)`, the
    /// operation, then `translate(-origin)`.
    pub fn apply(&self, ctx: &DrawContext) {
        for step in &self.0 {
            match *step {
                TransformStep::Translate { x, y } => ctx.translate(x, y),
                TransformStep::Scale { x, y, origin } => {
                    with_pivot(ctx, origin, |ctx| ctx.scale(x, y));
                }
                TransformStep::Rotate { angle, origin } => {
                    with_pivot(ctx, origin, |ctx| ctx.rotate(angle));
                }
            }
        }
    }
}

fn with_pivot(ctx: &DrawContext, origin: Option<Point>, op: impl FnOnce(&DrawContext)) {
    match origin {
        Some(o) => {
            ctx.translate(o.x, o.y);
            op(ctx);
            ctx.translate(-o.x, -o.y);
        }
        None => op(ctx),
    }
}

/// Combines a node's own transform with its inherited accumulation.
///
/// Returns the new accumulation and the `[translate, scale, rotate]` list
/// carrying the accumulated values plus this node's own pivots.
pub fn compose(
    own: &TransformSpec,
    inherited: &AccumulatedTransform,
) -> (AccumulatedTransform, TransformList) {
    let translate = own.translate.unwrap_or_default();
    let scale = own.scale.unwrap_or_default();
    let rotate = own.rotate.unwrap_or_default();

    let accumulated = AccumulatedTransform {
        translate_x: inherited.translate_x + translate.x,
        translate_y: inherited.translate_y + translate.y,
        scale_x: inherited.scale_x * scale.x,
        scale_y: inherited.scale_y * scale.y,
        angle: inherited.angle + rotate.angle,
    };

    let list = TransformList(vec![
        TransformStep::Translate {
            x: accumulated.translate_x,
            y: accumulated.translate_y,
        },
        TransformStep::Scale {
            x: accumulated.scale_x,
            y: accumulated.scale_y,
            origin: scale.origin,
        },
        TransformStep::Rotate {
            angle: accumulated.angle,
            origin: rotate.origin,
        },
    ]);

    (accumulated, list)
}
