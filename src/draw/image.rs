//! PNG image assets with a load-once cache.

use log::{debug, error};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A decoded image, or the empty placeholder left behind by a failed load.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    surface: Option<cairo::ImageSurface>,
}

impl ImageAsset {
    /// Placeholder with zero natural size that draws nothing.
    pub fn missing() -> Self {
        Self { surface: None }
    }

    pub fn from_surface(surface: cairo::ImageSurface) -> Self {
        Self {
            surface: Some(surface),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&cairo::ImageSurface> {
        self.surface.as_ref()
    }

    pub fn natural_width(&self) -> f64 {
        self.surface.as_ref().map_or(0.0, |s| s.width() as f64)
    }

    pub fn natural_height(&self) -> f64 {
        self.surface.as_ref().map_or(0.0, |s| s.height() as f64)
    }
}

/// Loads PNG files relative to a base directory, once per path.
#[derive(Debug, Default)]
pub struct ImageCache {
    base_dir: PathBuf,
    entries: HashMap<PathBuf, ImageAsset>,
}

impl ImageCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            entries: HashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the asset for `src`, loading it on first use.
    ///
    /// A failed load is logged once and cached as [`ImageAsset::missing`].
    pub fn load(&mut self, src: &Path) -> ImageAsset {
        let path = if src.is_absolute() {
            src.to_path_buf()
        } else {
            self.base_dir.join(src)
        };
        if let Some(asset) = self.entries.get(&path) {
            return asset.clone();
        }

        let asset = match read_png(&path) {
            Ok(surface) => {
                debug!(
                    "Loaded image {} ({}x{})",
                    path.display(),
                    surface.width(),
                    surface.height()
                );
                ImageAsset::from_surface(surface)
            }
            Err(err) => {
                error!("Failed to load image {}: {:#}", path.display(), err);
                ImageAsset::missing()
            }
        };
        self.entries.insert(path, asset.clone());
        asset
    }
}

fn read_png(path: &Path) -> anyhow::Result<cairo::ImageSurface> {
    use anyhow::Context as _;

    let mut file = File::open(path).context("open failed")?;
    let surface = cairo::ImageSurface::create_from_png(&mut file).context("decode failed")?;
    Ok(surface)
}
