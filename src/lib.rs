//! Retained-mode 2D scene rendering on Cairo surfaces.
//!
//! Primitives are declared into a [`registry::Registry`] of named surfaces;
//! the render loop repaints dirty surfaces once per frame in zIndex order
//! with opacity and transforms inherited from their declaration scope.
//! [`scene`] adds a declarative tree on top that can be loaded from TOML.

pub mod config;
pub mod draw;
pub mod engine;
pub mod error;
pub mod registry;
pub mod render;
pub mod scene;
pub mod util;

pub use config::Config;
pub use engine::Engine;
