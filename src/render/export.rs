//! Flattening surfaces into a single image and reading pixels back.

use crate::draw::Color;
use crate::registry::{Registry, Surface};
use crate::util::Size;
use log::warn;

/// One premultiplied ARGB32 pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

/// Reads the pixel at device coordinates `(x, y)`.
///
/// Returns `None` when out of bounds or when the surface is finished.
pub fn read_pixel(image: &cairo::ImageSurface, x: i32, y: i32) -> Option<Pixel> {
    if x < 0 || y < 0 || x >= image.width() || y >= image.height() {
        return None;
    }
    let stride = image.stride() as usize;
    let offset = y as usize * stride + x as usize * 4;
    let mut pixel = None;
    image
        .with_data(|data| {
            if let Some(bytes) = data.get(offset..offset + 4) {
                let argb = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                pixel = Some(Pixel {
                    a: (argb >> 24) as u8,
                    r: (argb >> 16) as u8,
                    g: (argb >> 8) as u8,
                    b: argb as u8,
                });
            }
        })
        .ok()?;
    pixel
}

/// Composites every surface, lowest `z_index` first (ties in registration
/// order), over `background` into one image of `size * scale` device pixels.
///
/// Surfaces whose pixels cannot be copied are skipped with a warning.
pub fn flatten(
    registry: &Registry,
    size: Size,
    scale: f64,
    background: Color,
) -> Result<cairo::ImageSurface, cairo::Error> {
    let (width, height) = size.device_pixels(scale);
    let target = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)?;
    {
        let cr = cairo::Context::new(&target)?;
        cr.set_source_rgba(background.r, background.g, background.b, background.a);
        cr.paint()?;

        let mut surfaces: Vec<&Surface> = registry.surfaces().collect();
        surfaces.sort_by_key(|surface| surface.z_index());
        for surface in surfaces {
            let snapshot = match surface.snapshot() {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!("Skipping surface '{}' in export: {}", surface.name(), err);
                    continue;
                }
            };
            cr.set_source_surface(&snapshot, 0.0, 0.0)?;
            cr.paint()?;
        }
    }
    target.flush();
    Ok(target)
}
