//! Configuration type definitions.

use crate::draw::Color;
use crate::render::DrawErrorPolicy;
use crate::util::Size;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canvas settings used when a scene creates its own surfaces.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CanvasConfig {
    /// Logical width in pixels (valid range: 1 - 16384)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Logical height in pixels (valid range: 1 - 16384)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Device pixels per logical pixel (valid range: 0.25 - 8.0)
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Color under all surfaces when the canvas is flattened - either a named
    /// color or an RGB array like `[255, 255, 255]`
    #[serde(default = "default_background")]
    pub background: Color,
}

impl CanvasConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scale: default_scale(),
            background: default_background(),
        }
    }
}

/// Painting behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RenderConfig {
    /// What a failing draw callback does to the rest of its surface's pass:
    /// `abort-surface` stops the pass for that frame, `skip-primitive` logs
    /// and moves on to the next primitive
    #[serde(default)]
    pub draw_error_policy: DrawErrorPolicy,
}

/// Frame pacing for the headless renderer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceConfig {
    /// Milliseconds between frames (valid range: 1 - 1000)
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Upper bound on frames run before exiting (valid range: 1 - 100000)
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,

    /// Exit as soon as a frame leaves nothing dirty
    #[serde(default = "default_stop_when_idle")]
    pub stop_when_idle: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            max_frames: default_max_frames(),
            stop_when_idle: default_stop_when_idle(),
        }
    }
}

fn default_width() -> u32 {
    500
}

fn default_height() -> u32 {
    300
}

fn default_scale() -> f64 {
    1.0
}

fn default_background() -> Color {
    crate::draw::WHITE
}

fn default_frame_interval() -> u64 {
    16
}

fn default_max_frames() -> u64 {
    120
}

fn default_stop_when_idle() -> bool {
    true
}
