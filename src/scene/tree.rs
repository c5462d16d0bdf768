//! Declarative scene description, loadable from TOML.
//!
//! ```toml
//! [[surface]]
//! name = "background"
//!
//! [[surface.children]]
//! type = "shape"
//! kind = "rect"
//! width = 100
//! height = 50
//! fill = "blue"
//!
//! [[surface.children]]
//! type = "group"
//! x = 20
//! y = 20
//! opacity = 0.5
//!
//! [[surface.children.children]]
//! type = "shape"
//! kind = "circle"
//! radius = 10
//! ```

use super::group::GroupSpec;
use super::transform::TransformSpec;
use crate::draw::Shape;
use crate::error::SceneError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A whole scene: the surfaces and everything declared on them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    #[serde(default, rename = "surface")]
    pub surfaces: Vec<SurfaceNode>,
}

impl Scene {
    /// Parses a scene from TOML text.
    pub fn from_toml(text: &str) -> Result<Scene, SceneError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a scene file.
    pub fn load(path: &Path) -> Result<Scene, SceneError> {
        let text = fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Number of shape nodes across all surfaces.
    pub fn shape_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    Node::Shape(_) => 1,
                    Node::Group { children, .. } | Node::Transform { children, .. } => {
                        count(children)
                    }
                })
                .sum()
        }
        self.surfaces.iter().map(|s| count(&s.children)).sum()
    }
}

/// A named drawing surface and its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurfaceNode {
    pub name: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Stacking order when surfaces are flattened.
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// One node of a surface's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Group {
        #[serde(default)]
        key: Option<String>,
        #[serde(flatten)]
        group: GroupSpec,
        #[serde(default)]
        children: Vec<Node>,
    },
    Transform {
        #[serde(default)]
        key: Option<String>,
        #[serde(flatten)]
        transform: TransformSpec,
        #[serde(default)]
        children: Vec<Node>,
    },
    Shape(ShapeNode),
}

/// A shape with its own opacity and zIndex.
///
/// A `key` gives the shape an identity that survives reordering and moves
/// between surfaces; unkeyed shapes are identified by their position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShapeNode {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub z_index: i32,
    #[serde(flatten)]
    pub shape: Shape,
}

fn default_opacity() -> f64 {
    1.0
}
