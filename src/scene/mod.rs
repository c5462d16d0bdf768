//! Declarative scene layer: transforms, groups, declaration scopes and the
//! reconciler that maps scene trees onto the registry.

pub mod bbox;
pub mod group;
pub mod reconcile;
pub mod scope;
pub mod transform;
pub mod tree;

pub use bbox::{transform_box, transform_point};
pub use group::{GroupParams, GroupSpec};
pub use reconcile::{ApplySummary, Reconciler};
pub use scope::DeclareScope;
pub use transform::{
    AccumulatedTransform, Rotate, Scale, TransformList, TransformSpec, TransformStep, Translate,
    compose,
};
pub use tree::{Node, Scene, ShapeNode, SurfaceNode};
