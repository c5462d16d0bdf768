//! Frame scheduling for the render loop.
//!
//! The loop never paces itself. A [`FrameClock`] hands out frame requests
//! and later delivers them back, at which point the loop runs one tick. Each
//! tick requests the next frame before doing any work, so at most one
//! request is ever outstanding.

use log::{debug, info};

/// Token identifying one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Source of "next frame" callbacks.
pub trait FrameClock {
    /// Asks for one future frame.
    fn request_frame(&mut self) -> FrameRequest;

    /// Withdraws a previously requested frame if it has not fired yet.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Clock that holds at most one pending request until the host collects it.
///
/// Mirrors a compositor frame callback: the host calls
/// [`take_due`](Self::take_due) when it is ready to present and feeds the
/// result back into the loop.
#[derive(Debug, Default)]
pub struct FrameCallbackClock {
    next: u64,
    pending: Option<FrameRequest>,
}

impl FrameCallbackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the outstanding request, if any.
    pub fn take_due(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl FrameClock for FrameCallbackClock {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

/// Lifecycle of a [`RenderLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not yet started, or restarted.
    Idle,
    /// A frame is scheduled.
    Running,
    /// Cancelled; no further frames will be requested.
    Stopped,
}

/// Scheduling state machine driving the per-frame paint.
#[derive(Debug)]
pub struct RenderLoop<C: FrameClock> {
    clock: C,
    state: LoopState,
    pending: Option<FrameRequest>,
    frames: u64,
}

impl<C: FrameClock> RenderLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: LoopState::Idle,
            pending: None,
            frames: 0,
        }
    }

    /// Schedules the first frame. Only an idle loop can start.
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        self.state = LoopState::Running;
        self.pending = Some(self.clock.request_frame());
        info!("Render loop started");
        true
    }

    /// Accepts a delivered frame.
    ///
    /// Returns `true` when the caller should paint. The next frame is already
    /// requested by then. Stale or unexpected requests are ignored.
    pub fn begin_tick(&mut self, request: FrameRequest) -> bool {
        if self.state != LoopState::Running || self.pending != Some(request) {
            debug!("Ignoring stale frame request {:?}", request);
            return false;
        }
        self.pending = Some(self.clock.request_frame());
        self.frames += 1;
        true
    }

    /// Stops scheduling. A tick already in progress is unaffected.
    pub fn cancel(&mut self) {
        if let Some(request) = self.pending.take() {
            self.clock.cancel_frame(request);
        }
        if self.state != LoopState::Stopped {
            info!("Render loop cancelled after {} frames", self.frames);
        }
        self.state = LoopState::Stopped;
    }

    /// Cancels any pending frame and returns to [`LoopState::Idle`].
    pub fn restart(&mut self) {
        if let Some(request) = self.pending.take() {
            self.clock.cancel_frame(request);
        }
        self.state = LoopState::Idle;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Number of ticks accepted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
