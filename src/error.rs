//! Error types surfaced by the registry, the render loop and the scene layer.

use crate::registry::PrimitiveId;
use std::path::PathBuf;
use thiserror::Error;

/// A drawing context could not be acquired for a surface.
///
/// Registration is aborted and no surface state is created.
#[derive(Debug, Error)]
#[error("Unable to register surface '{name}': {source}")]
pub struct RegistrationError {
    pub name: String,
    #[source]
    pub source: cairo::Error,
}

/// A primitive was declared without an enclosing registered surface.
///
/// Treated as an integration error at the call site; the primitive is never
/// silently dropped.
#[derive(Debug, Error)]
pub enum MissingRegistryError {
    #[error("Primitive {0:?} was declared outside of any surface scope")]
    NoSurfaceScope(PrimitiveId),

    #[error("Primitive {id:?} targets surface '{surface}', which is not registered")]
    UnregisteredSurface { id: PrimitiveId, surface: String },
}

/// Errors returned by registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    MissingRegistry(#[from] MissingRegistryError),

    #[error("Primitive handle {0:?} is stale or was never issued")]
    StaleId(PrimitiveId),

    #[error("Surface '{0}' is not registered")]
    UnknownSurface(String),

    #[error("Failed to resize surface '{name}': {source}")]
    Resize {
        name: String,
        #[source]
        source: cairo::Error,
    },
}

/// Failure raised from inside a draw callback, a transform or a compositor.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("Cairo operation failed: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("Text layout failed: {0}")]
    Text(String),

    #[error("{0}")]
    Callback(String),
}

/// A draw failure attributed to the surface (and primitive, when known) it
/// happened on.
#[derive(Debug, Error)]
#[error("Drawing surface '{surface}' failed{}: {source}", primitive_suffix(.primitive))]
pub struct DrawCallbackError {
    pub surface: String,
    pub primitive: Option<PrimitiveId>,
    #[source]
    pub source: DrawError,
}

fn primitive_suffix(primitive: &Option<PrimitiveId>) -> String {
    match primitive {
        Some(id) => format!(" at primitive {id:?}"),
        None => String::new(),
    }
}

/// Errors raised while loading or applying a declarative scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to read scene from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<MissingRegistryError> for SceneError {
    fn from(err: MissingRegistryError) -> Self {
        SceneError::Registry(RegistryError::MissingRegistry(err))
    }
}

impl From<RegistrationError> for SceneError {
    fn from(err: RegistrationError) -> Self {
        SceneError::Registry(RegistryError::Registration(err))
    }
}
