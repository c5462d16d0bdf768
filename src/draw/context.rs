//! Drawing context handed to primitives, wrapping a Cairo context.
//!
//! Cairo has no notion of a global alpha, so [`DrawContext`] carries one and
//! folds it into every source color or surface paint issued through it. The
//! alpha participates in [`save`](DrawContext::save) /
//! [`restore`](DrawContext::restore) exactly like the Cairo graphics state.

use super::color::Color;

/// 2D drawing context bound to one surface for that surface's lifetime.
pub struct DrawContext {
    cr: cairo::Context,
    global_alpha: f64,
    alpha_stack: Vec<f64>,
}

impl std::fmt::Debug for DrawContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("global_alpha", &self.global_alpha)
            .field("depth", &self.alpha_stack.len())
            .finish()
    }
}

impl DrawContext {
    /// Wraps a freshly created Cairo context with full opacity.
    pub fn new(cr: cairo::Context) -> Self {
        Self {
            cr,
            global_alpha: 1.0,
            alpha_stack: Vec::new(),
        }
    }

    /// Underlying Cairo context for path construction and stroking.
    pub fn cairo(&self) -> &cairo::Context {
        &self.cr
    }

    /// Alpha currently in effect, as set (not clamped).
    pub fn global_alpha(&self) -> f64 {
        self.global_alpha
    }

    /// Sets the alpha multiplied into subsequent paint operations.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.global_alpha = alpha;
    }

    /// Alpha actually applied to paint operations, clamped to `[0, 1]`.
    pub fn effective_alpha(&self) -> f64 {
        if self.global_alpha.is_nan() {
            return 0.0;
        }
        self.global_alpha.clamp(0.0, 1.0)
    }

    /// Pushes the Cairo graphics state and the current alpha.
    pub fn save(&mut self) -> Result<(), cairo::Error> {
        self.cr.save()?;
        self.alpha_stack.push(self.global_alpha);
        Ok(())
    }

    /// Pops the state pushed by the matching [`save`](Self::save).
    pub fn restore(&mut self) -> Result<(), cairo::Error> {
        self.cr.restore()?;
        if let Some(alpha) = self.alpha_stack.pop() {
            self.global_alpha = alpha;
        }
        Ok(())
    }

    /// Number of unmatched `save` calls.
    pub fn save_depth(&self) -> usize {
        self.alpha_stack.len()
    }

    pub fn translate(&self, dx: f64, dy: f64) {
        self.cr.translate(dx, dy);
    }

    pub fn scale(&self, sx: f64, sy: f64) {
        self.cr.scale(sx, sy);
    }

    pub fn rotate(&self, angle: f64) {
        self.cr.rotate(angle);
    }

    /// Sets a solid source with the color's alpha multiplied by the global alpha.
    pub fn set_source_color(&self, color: Color) {
        self.cr.set_source_rgba(
            color.r,
            color.g,
            color.b,
            color.a * self.effective_alpha(),
        );
    }

    /// Paints `image` scaled into the rectangle `(x, y, width, height)`.
    pub fn paint_image(
        &self,
        image: &cairo::ImageSurface,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), cairo::Error> {
        let natural_w = image.width() as f64;
        let natural_h = image.height() as f64;
        if natural_w <= 0.0 || natural_h <= 0.0 || width <= 0.0 || height <= 0.0 {
            return Ok(());
        }

        self.cr.save()?;
        self.cr.translate(x, y);
        self.cr.scale(width / natural_w, height / natural_h);
        self.cr.set_source_surface(image, 0.0, 0.0)?;
        let painted = self.cr.paint_with_alpha(self.effective_alpha());
        self.cr.restore()?;
        painted
    }

    /// Clears every pixel of the target surface to transparent, ignoring
    /// the current transform and clip.
    pub fn clear(&self) -> Result<(), cairo::Error> {
        self.cr.save()?;
        self.cr.identity_matrix();
        self.cr.reset_clip();
        self.cr.set_operator(cairo::Operator::Clear);
        let cleared = self.cr.paint();
        self.cr.restore()?;
        cleared
    }

    /// Resets the transform to the device scale and drops any saved state.
    pub(crate) fn reset(&mut self, scale: f64) {
        while !self.alpha_stack.is_empty() {
            if self.restore().is_err() {
                self.alpha_stack.clear();
            }
        }
        self.global_alpha = 1.0;
        self.cr.identity_matrix();
        self.cr.scale(scale, scale);
    }
}
