//! Registry plus render loop, driven by a frame clock.

use crate::error::RegistrationError;
use crate::registry::{Registry, SurfaceHandle, SurfaceOptions};
use crate::render::{
    Compositor, DrawErrorPolicy, FrameCallbackClock, FrameClock, FrameReport, FrameRequest,
    RenderLoop, paint_dirty_surfaces,
};
use log::debug;

/// Owns the registry and the loop that paints it.
///
/// The loop starts by itself on the first successful surface registration.
/// Hosts feed delivered frames back through [`on_frame`](Self::on_frame),
/// or call [`pump`](Engine::pump) when using the default clock.
#[derive(Debug)]
pub struct Engine<C: FrameClock = FrameCallbackClock> {
    registry: Registry,
    render_loop: RenderLoop<C>,
    policy: DrawErrorPolicy,
}

impl Engine<FrameCallbackClock> {
    pub fn new() -> Self {
        Self::with_clock(FrameCallbackClock::new())
    }

    /// Delivers the pending frame, if any, and paints.
    pub fn pump(&mut self) -> Option<FrameReport> {
        let request = self.render_loop.clock_mut().take_due()?;
        self.on_frame(request)
    }
}

impl Default for Engine<FrameCallbackClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: FrameClock> Engine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            registry: Registry::new(),
            render_loop: RenderLoop::new(clock),
            policy: DrawErrorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DrawErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: DrawErrorPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> DrawErrorPolicy {
        self.policy
    }

    /// Registers a surface and starts the loop if it is idle.
    pub fn register_surface(
        &mut self,
        name: impl Into<String>,
        handle: impl SurfaceHandle + 'static,
        opacity: f64,
        compositor: Option<Box<dyn Compositor>>,
    ) -> Result<bool, RegistrationError> {
        let registered = self
            .registry
            .register_surface(name, handle, opacity, compositor)?;
        if registered {
            self.render_loop.start();
        }
        Ok(registered)
    }

    /// Same as [`register_surface`](Self::register_surface) with full options.
    pub fn register_surface_with(
        &mut self,
        name: impl Into<String>,
        handle: impl SurfaceHandle + 'static,
        options: SurfaceOptions,
    ) -> Result<bool, RegistrationError> {
        let registered = self.registry.register_surface_with(name, handle, options)?;
        if registered {
            self.render_loop.start();
        }
        Ok(registered)
    }

    /// Explicitly starts an idle loop.
    pub fn start(&mut self) -> bool {
        self.render_loop.start()
    }

    /// Runs one tick for a delivered frame.
    ///
    /// Returns `None` if the request is stale or the loop is not running.
    pub fn on_frame(&mut self, request: FrameRequest) -> Option<FrameReport> {
        if !self.render_loop.begin_tick(request) {
            return None;
        }
        let frame_index = self.render_loop.frames();
        let report = paint_dirty_surfaces(&mut self.registry, self.policy, frame_index);
        if !report.painted.is_empty() {
            debug!(
                "Frame {} painted {} surface(s)",
                frame_index,
                report.painted.len()
            );
        }
        Some(report)
    }

    /// Stops scheduling frames.
    pub fn cancel(&mut self) {
        self.render_loop.cancel();
    }

    /// Returns the loop to its initial unscheduled state.
    ///
    /// The next registration or [`start`](Self::start) schedules again.
    pub fn restart(&mut self) {
        self.render_loop.restart();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn render_loop(&self) -> &RenderLoop<C> {
        &self.render_loop
    }

    pub fn render_loop_mut(&mut self) -> &mut RenderLoop<C> {
        &mut self.render_loop
    }
}
