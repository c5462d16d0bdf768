//! Applies declarative scenes to an engine, diffing against the previous one.
//!
//! Each shape is identified by its `key` when it has one, otherwise by its
//! position (`surface/child/child/...`). Identities that survive between two
//! applications keep their [`PrimitiveId`], so a changed shape is replaced in
//! place and a keyed shape moved to another surface is moved, not re-created.

use super::scope::DeclareScope;
use super::tree::{Node, Scene, ShapeNode};
use crate::draw::{ShapeResources, render_shape};
use crate::engine::Engine;
use crate::error::SceneError;
use crate::registry::{ImageCanvas, PrimitiveId, ShapeParams, SurfaceOptions};
use crate::render::FrameClock;
use crate::util::Size;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Counts from one [`Reconciler::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplySummary {
    pub surfaces_added: usize,
    pub surfaces_removed: usize,
    pub declared: usize,
    pub removed: usize,
}

/// Keeps a scene tree and the registry in sync.
#[derive(Debug)]
pub struct Reconciler {
    size: Size,
    scale: f64,
    resources: ShapeResources,
    ids: HashMap<String, PrimitiveId>,
    surfaces: Vec<String>,
}

impl Reconciler {
    /// New surfaces are created as `size` logical pixels at `scale`.
    pub fn new(size: Size, scale: f64) -> Self {
        Self::with_asset_dir(size, scale, PathBuf::from("."))
    }

    /// Same as [`new`](Self::new), resolving image paths against `asset_dir`.
    pub fn with_asset_dir(size: Size, scale: f64, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            size,
            scale,
            resources: ShapeResources::new(asset_dir),
            ids: HashMap::new(),
            surfaces: Vec::new(),
        }
    }

    pub fn resources(&self) -> &ShapeResources {
        &self.resources
    }

    /// Id currently bound to a shape identity.
    ///
    /// Keyed shapes are named `key:<key>`; unkeyed shapes are named by their
    /// position, `path:<surface>/<segment>/...`, where a keyed ancestor's
    /// segment is `#<key>` and any other segment is its child index.
    pub fn id_for(&self, identity: &str) -> Option<PrimitiveId> {
        self.ids.get(identity).copied()
    }

    /// Brings the engine in line with `scene`.
    ///
    /// Surfaces are registered (or updated) first, then every shape is
    /// declared. Shapes and surfaces from the previous application that no
    /// longer appear are removed and their ids retired.
    pub fn apply<C: FrameClock>(
        &mut self,
        engine: &mut Engine<C>,
        scene: &Scene,
    ) -> Result<ApplySummary, SceneError> {
        let mut summary = ApplySummary::default();

        let mut wanted: Vec<String> = Vec::new();
        for node in &scene.surfaces {
            if wanted.contains(&node.name) {
                warn!("Surface '{}' declared twice; merging children", node.name);
                continue;
            }
            wanted.push(node.name.clone());

            if engine.registry().surface(&node.name).is_some() {
                let registry = engine.registry_mut();
                registry.set_surface_opacity(&node.name, node.opacity)?;
                registry.set_surface_z_index(&node.name, node.z_index)?;
                continue;
            }

            let canvas = ImageCanvas::new(self.size, self.scale).map_err(|source| {
                crate::error::RegistrationError {
                    name: node.name.clone(),
                    source,
                }
            })?;
            let options = SurfaceOptions::default()
                .with_opacity(node.opacity)
                .with_z_index(node.z_index);
            if engine.register_surface_with(node.name.clone(), canvas, options)? {
                summary.surfaces_added += 1;
            }
        }

        let mut seen = HashSet::new();
        for node in &scene.surfaces {
            let scope = DeclareScope::root().within_surface(node.name.clone());
            for (index, child) in node.children.iter().enumerate() {
                let path = format!("{}/{}", escape_segment(&node.name), segment(child, index));
                self.declare_node(engine, &scope, child, &path, &mut seen, &mut summary)?;
            }
        }

        let stale: Vec<String> = self
            .ids
            .keys()
            .filter(|identity| !seen.contains(*identity))
            .cloned()
            .collect();
        for identity in stale {
            if let Some(id) = self.ids.remove(&identity) {
                engine.registry_mut().retire_id(id);
                summary.removed += 1;
                debug!("Removed shape '{}' ({:?})", identity, id);
            }
        }

        let previous = std::mem::replace(&mut self.surfaces, wanted);
        for name in previous {
            if !self.surfaces.contains(&name) && engine.registry_mut().unregister_surface(&name) {
                summary.surfaces_removed += 1;
            }
        }

        info!(
            "Applied scene: {} shapes declared, {} removed, {} surfaces added, {} removed",
            summary.declared, summary.removed, summary.surfaces_added, summary.surfaces_removed
        );
        Ok(summary)
    }

    fn declare_node<C: FrameClock>(
        &mut self,
        engine: &mut Engine<C>,
        scope: &DeclareScope,
        node: &Node,
        path: &str,
        seen: &mut HashSet<String>,
        summary: &mut ApplySummary,
    ) -> Result<(), SceneError> {
        let (inner, children) = match node {
            Node::Shape(shape) => {
                return self.declare_shape(engine, scope, shape, path, seen, summary);
            }
            Node::Group {
                group, children, ..
            } => (scope.within_group(group), children),
            Node::Transform {
                transform,
                children,
                ..
            } => (scope.within_transform(transform), children),
        };

        for (index, child) in children.iter().enumerate() {
            let child_path = format!("{}/{}", path, segment(child, index));
            self.declare_node(engine, &inner, child, &child_path, seen, summary)?;
        }
        Ok(())
    }

    fn declare_shape<C: FrameClock>(
        &mut self,
        engine: &mut Engine<C>,
        scope: &DeclareScope,
        node: &ShapeNode,
        path: &str,
        seen: &mut HashSet<String>,
        summary: &mut ApplySummary,
    ) -> Result<(), SceneError> {
        let identity = match &node.key {
            Some(key) => format!("key:{key}"),
            None => format!("path:{path}"),
        };
        if !seen.insert(identity.clone()) {
            warn!("Shape identity '{}' declared twice; last one wins", identity);
        }

        let registry = engine.registry_mut();
        let id = match self.ids.get(&identity) {
            Some(id) if registry.is_live(*id) => *id,
            _ => {
                let id = registry.issue_id();
                self.ids.insert(identity, id);
                id
            }
        };

        let bbox = node.shape.bounding_box(&mut self.resources);
        let image = node.shape.image_asset(&mut self.resources);
        let shape = node.shape.clone();
        let record = scope.declare(
            id,
            ShapeParams::new(node.opacity, node.z_index, bbox),
            move |ctx| render_shape(ctx, &shape, image.as_ref()),
        )?;
        registry.set_primitive(record)?;
        summary.declared += 1;
        Ok(())
    }
}

fn segment(node: &Node, index: usize) -> String {
    let key = match node {
        Node::Group { key, .. } | Node::Transform { key, .. } => key.as_ref(),
        Node::Shape(shape) => shape.key.as_ref(),
    };
    match key {
        Some(key) => format!("#{}", escape_segment(key)),
        None => index.to_string(),
    }
}

/// Escapes `/` so a name cannot span more than one path segment.
fn escape_segment(name: &str) -> String {
    name.replace('%', "%25").replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(text: &str) -> Scene {
        Scene::from_toml(text).unwrap()
    }

    const TWO_SURFACES: &str = r#"
[[surface]]
name = "a"

[[surface.children]]
type = "shape"
key = "box"
kind = "rect"
width = 10
height = 10
fill = "red"

[[surface.children]]
type = "shape"
kind = "circle"
radius = 3

[[surface]]
name = "b"
"#;

    const MOVED: &str = r#"
[[surface]]
name = "a"

[[surface]]
name = "b"

[[surface.children]]
type = "shape"
key = "box"
kind = "rect"
x = 5
width = 10
height = 10
fill = "red"
"#;

    #[test]
    fn reapply_keeps_ids_and_moves_keyed_shapes() {
        let mut engine = Engine::new();
        let mut reconciler = Reconciler::new(Size::new(50, 50), 1.0);

        let first = reconciler
            .apply(&mut engine, &scene(TWO_SURFACES))
            .unwrap();
        assert_eq!(first.surfaces_added, 2);
        assert_eq!(first.declared, 2);
        let id = reconciler.id_for("key:box").unwrap();
        assert_eq!(engine.registry().owner_of(id), Some("a"));

        let second = reconciler.apply(&mut engine, &scene(MOVED)).unwrap();
        assert_eq!(second.surfaces_added, 0);
        assert_eq!(second.declared, 1);
        assert_eq!(second.removed, 1);
        assert_eq!(reconciler.id_for("key:box"), Some(id));
        assert_eq!(engine.registry().owner_of(id), Some("b"));
        assert!(engine.registry().primitives_on("a").is_empty());
    }

    #[test]
    fn dropped_surfaces_are_unregistered() {
        let mut engine = Engine::new();
        let mut reconciler = Reconciler::new(Size::new(10, 10), 1.0);
        reconciler
            .apply(&mut engine, &scene(TWO_SURFACES))
            .unwrap();

        let summary = reconciler
            .apply(&mut engine, &scene("[[surface]]\nname = \"b\"\n"))
            .unwrap();
        assert_eq!(summary.surfaces_removed, 1);
        assert_eq!(summary.removed, 2);
        assert_eq!(engine.registry().surface_names(), vec!["b"]);
        assert_eq!(engine.registry().primitive_count(), 0);
    }

    #[test]
    fn group_params_reach_the_registry() {
        let text = r#"
[[surface]]
name = "a"

[[surface.children]]
type = "group"
x = 10
y = 20
opacity = 0.5
z_index = 4

[[surface.children.children]]
type = "shape"
key = "r"
kind = "rect"
width = 5
height = 5
opacity = 0.5
z_index = 1
"#;
        let mut engine = Engine::new();
        let mut reconciler = Reconciler::new(Size::new(40, 40), 1.0);
        reconciler.apply(&mut engine, &scene(text)).unwrap();

        let id = reconciler.id_for("key:r").unwrap();
        let record = engine.registry().primitive(id).unwrap();
        assert_eq!(record.params.opacity, 0.25);
        assert_eq!(record.params.z_index, 5);
        assert_eq!(
            record.params.bbox,
            crate::util::BoundingBox::new(10.0, 20.0, 5.0, 5.0)
        );
    }

    #[test]
    fn keyed_and_positional_identities_never_collide() {
        let text = r##"
[[surface]]
name = "#x"

[[surface.children]]
type = "shape"
kind = "rect"
width = 4
height = 4

[[surface.children]]
type = "shape"
key = "x/0"
kind = "rect"
width = 4
height = 4
"##;
        let mut engine = Engine::new();
        let mut reconciler = Reconciler::new(Size::new(10, 10), 1.0);
        let summary = reconciler.apply(&mut engine, &scene(text)).unwrap();

        assert_eq!(summary.declared, 2);
        let positional = reconciler.id_for("path:#x/0").unwrap();
        let keyed = reconciler.id_for("key:x/0").unwrap();
        assert_ne!(positional, keyed);
        assert_eq!(engine.registry().primitives_on("#x").len(), 2);
    }

    #[test]
    fn slashes_in_surface_names_stay_in_one_segment() {
        let text = r#"
[[surface]]
name = "a/0"

[[surface.children]]
type = "shape"
kind = "rect"
width = 4
height = 4

[[surface]]
name = "a"

[[surface.children]]
type = "group"

[[surface.children.children]]
type = "shape"
kind = "rect"
width = 4
height = 4
"#;
        let mut engine = Engine::new();
        let mut reconciler = Reconciler::new(Size::new(10, 10), 1.0);
        let summary = reconciler.apply(&mut engine, &scene(text)).unwrap();

        assert_eq!(summary.declared, 2);
        assert!(reconciler.id_for("path:a%2F0/0").is_some());
        assert!(reconciler.id_for("path:a/0/0").is_some());
        assert_eq!(engine.registry().primitive_count(), 2);
    }
}
