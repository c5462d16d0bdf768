//! Drawing context, colors, shapes and their Cairo rendering.
//!
//! This module defines the drawing-side types used by primitives:
//! - [`DrawContext`]: Cairo context with a scoped global alpha
//! - [`Color`]: RGBA color representation with predefined color constants
//! - [`Shape`]: circle, ellipse, rect, line, polygon, text and image primitives
//! - Text metrics and image asset caches feeding shape bounding boxes

pub mod color;
pub mod context;
pub mod image;
pub mod render;
pub mod shape;
pub mod text;

pub use color::Color;
pub use context::DrawContext;
pub use image::{ImageAsset, ImageCache};
pub use render::render_shape;
pub use shape::{Shape, ShapeResources, TextAlign, TextBaseline};
pub use text::{MetricsCache, TextMetrics};

pub use color::{BLACK, BLUE, GREEN, ORANGE, PINK, RED, TRANSPARENT, WHITE, YELLOW};
