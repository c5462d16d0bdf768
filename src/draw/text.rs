//! Text measurement through Pango, with a per-(font, text) cache.
//!
//! Fonts use Pango description syntax, e.g. `"Sans 16px"` or
//! `"Monospace Bold 12"`.

use log::warn;
use std::collections::HashMap;

/// Font used when a text shape does not name one.
pub const DEFAULT_FONT: &str = "Sans 16px";

/// Measured extents of a single run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Advance width of the logical layout.
    pub width: f64,
    /// Distance from the baseline up to the top of the inked glyphs.
    pub ascent: f64,
    /// Distance from the baseline down to the bottom of the inked glyphs.
    pub descent: f64,
    /// Baseline offset from the top of the logical layout.
    pub baseline: f64,
    /// Height of the logical layout.
    pub logical_height: f64,
}

impl TextMetrics {
    /// Height of the inked glyphs.
    pub fn ink_height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// Builds a Pango layout for `text` in `font` on the given Cairo context.
pub fn create_layout(cr: &cairo::Context, text: &str, font: &str) -> pango::Layout {
    let layout = pangocairo::functions::create_layout(cr);
    let font_desc = pango::FontDescription::from_string(font);
    layout.set_font_description(Some(&font_desc));
    layout.set_text(text);
    layout
}

/// Measures an existing layout.
pub fn layout_metrics(layout: &pango::Layout) -> TextMetrics {
    let scale = pango::SCALE as f64;
    let (ink_rect, logical_rect) = layout.extents();
    let baseline = layout.baseline() as f64 / scale;
    let ink_top = ink_rect.y() as f64 / scale;
    let ink_bottom = (ink_rect.y() + ink_rect.height()) as f64 / scale;

    TextMetrics {
        width: logical_rect.width() as f64 / scale,
        ascent: baseline - ink_top,
        descent: ink_bottom - baseline,
        baseline,
        logical_height: logical_rect.height() as f64 / scale,
    }
}

/// Measures text once per (font, text) pair.
///
/// Measurement happens on a private 1x1 surface that is created on first
/// use. If it cannot be created every lookup returns `None`.
#[derive(Default)]
pub struct MetricsCache {
    measure: Option<cairo::Context>,
    entries: HashMap<(String, String), TextMetrics>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns cached metrics, measuring on a miss. Empty text has no metrics.
    pub fn measure(&mut self, text: &str, font: &str) -> Option<TextMetrics> {
        if text.is_empty() || font.is_empty() {
            return None;
        }
        let key = (font.to_string(), text.to_string());
        if let Some(metrics) = self.entries.get(&key) {
            return Some(*metrics);
        }

        let cr = self.measure_context()?;
        let metrics = layout_metrics(&create_layout(cr, text, font));
        self.entries.insert(key, metrics);
        Some(metrics)
    }

    /// Cached metrics without measuring.
    pub fn get(&self, text: &str, font: &str) -> Option<TextMetrics> {
        self.entries
            .get(&(font.to_string(), text.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn measure_context(&mut self) -> Option<&cairo::Context> {
        if self.measure.is_none() {
            let created = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1)
                .and_then(|surface| cairo::Context::new(&surface));
            match created {
                Ok(cr) => self.measure = Some(cr),
                Err(err) => {
                    warn!("Text measurement unavailable: {}", err);
                    return None;
                }
            }
        }
        self.measure.as_ref()
    }
}

impl std::fmt::Debug for MetricsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
