//! Configuration file support for layerkit.
//!
//! Settings are read from `~/.config/layerkit/config.toml` unless a path is
//! given explicitly. They cover the canvas that scenes render into, how draw
//! failures are handled, and frame pacing for the headless renderer.
//!
//! If no config file exists, defaults are used.

pub mod types;

pub use types::{CanvasConfig, PerformanceConfig, RenderConfig};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
///
/// # Example TOML
/// ```toml
/// [canvas]
/// width = 800
/// height = 600
/// scale = 2.0
/// background = "black"
///
/// [render]
/// draw_error_policy = "skip-primitive"
///
/// [performance]
/// frame_interval_ms = 16
/// max_frames = 60
/// stop_when_idle = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Canvas size, scale and background
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Painting behavior
    #[serde(default)]
    pub render: RenderConfig,

    /// Frame pacing
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl Config {
    /// Clamps values to ranges the renderer can work with, warning for each.
    ///
    /// Validated ranges:
    /// - `canvas.width`, `canvas.height`: 1 - 16384
    /// - `canvas.scale`: 0.25 - 8.0
    /// - `performance.frame_interval_ms`: 1 - 1000
    /// - `performance.max_frames`: 1 - 100000
    fn validate_and_clamp(&mut self) {
        if !(1..=16384).contains(&self.canvas.width) {
            warn!(
                "Invalid canvas width {}, clamping to 1-16384 range",
                self.canvas.width
            );
            self.canvas.width = self.canvas.width.clamp(1, 16384);
        }

        if !(1..=16384).contains(&self.canvas.height) {
            warn!(
                "Invalid canvas height {}, clamping to 1-16384 range",
                self.canvas.height
            );
            self.canvas.height = self.canvas.height.clamp(1, 16384);
        }

        if !self.canvas.scale.is_finite() {
            warn!("Invalid canvas scale {}, using 1.0", self.canvas.scale);
            self.canvas.scale = 1.0;
        } else if !(0.25..=8.0).contains(&self.canvas.scale) {
            warn!(
                "Invalid canvas scale {:.2}, clamping to 0.25-8.0 range",
                self.canvas.scale
            );
            self.canvas.scale = self.canvas.scale.clamp(0.25, 8.0);
        }

        if !(1..=1000).contains(&self.performance.frame_interval_ms) {
            warn!(
                "Invalid frame_interval_ms {}, clamping to 1-1000 range",
                self.performance.frame_interval_ms
            );
            self.performance.frame_interval_ms = self.performance.frame_interval_ms.clamp(1, 1000);
        }

        if !(1..=100_000).contains(&self.performance.max_frames) {
            warn!(
                "Invalid max_frames {}, clamping to 1-100000 range",
                self.performance.max_frames
            );
            self.performance.max_frames = self.performance.max_frames.clamp(1, 100_000);
        }
    }

    /// Returns the path to the default configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("layerkit");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from `path`, or from the default location when
    /// `path` is `None`.
    ///
    /// A missing file yields the defaults. Loaded values are clamped to
    /// acceptable ranges.
    ///
    /// # Errors
    /// Returns an error if:
    /// - No path was given and the config directory cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::get_config_path()?,
        };

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config = Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        config.validate_and_clamp();
        Ok(config)
    }

    /// Parses and clamps a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(text)?;
        config.validate_and_clamp();
        Ok(config)
    }

    /// JSON schema describing the config file.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(Config);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawErrorPolicy;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.canvas.width, 500);
        assert_eq!(config.canvas.height, 300);
        assert_eq!(config.render.draw_error_policy, DrawErrorPolicy::AbortSurface);
        assert_eq!(config.performance.frame_interval_ms, 16);
    }

    #[test]
    fn loads_sections_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[canvas]\nwidth = 64\nbackground = [0, 0, 0]\n\n[render]\ndraw_error_policy = \"skip-primitive\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.canvas.width, 64);
        assert_eq!(config.canvas.height, 300);
        assert_eq!(config.canvas.background.r, 0.0);
        assert_eq!(
            config.render.draw_error_policy,
            DrawErrorPolicy::SkipPrimitive
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = Config::from_toml(
            "[canvas]\nwidth = 0\nscale = 40.0\n\n[performance]\nframe_interval_ms = 5000",
        )
        .unwrap();
        assert_eq!(config.canvas.width, 1);
        assert_eq!(config.canvas.scale, 8.0);
        assert_eq!(config.performance.frame_interval_ms, 1000);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::from_toml("[canvas\nwidth = 1").is_err());
    }

    #[test]
    fn schema_names_every_section() {
        let schema = Config::json_schema().to_string();
        assert!(schema.contains("draw_error_policy"));
        assert!(schema.contains("frame_interval_ms"));
        assert!(schema.contains("background"));
    }
}
