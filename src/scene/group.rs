//! Group opacity and z-order inheritance.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Opacity and z-order accumulated from enclosing groups.
///
/// Opacity multiplies across ancestors and zIndex adds. Neither is clamped
/// here; opacity is only clamped when it reaches a paint operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupParams {
    pub opacity: f64,
    pub z_index: i32,
}

impl GroupParams {
    /// Parameters in effect outside of any group.
    pub const ROOT: GroupParams = GroupParams {
        opacity: 1.0,
        z_index: 0,
    };

    /// Nests a group with the given own opacity and zIndex inside `self`.
    pub fn nest(&self, opacity: f64, z_index: i32) -> GroupParams {
        GroupParams {
            opacity: self.opacity * opacity,
            z_index: self.z_index.saturating_add(z_index),
        }
    }

    /// Resolves a shape's own opacity/zIndex against the enclosing groups.
    pub fn resolve(&self, opacity: f64, z_index: i32) -> (f64, i32) {
        let nested = self.nest(opacity, z_index);
        (nested.opacity, nested.z_index)
    }
}

impl Default for GroupParams {
    fn default() -> Self {
        Self::ROOT
    }
}

/// A group node's own parameters: an offset plus opacity and zIndex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupSpec {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub z_index: i32,
}

impl Default for GroupSpec {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            opacity: default_opacity(),
            z_index: 0,
        }
    }
}

fn default_opacity() -> f64 {
    1.0
}
