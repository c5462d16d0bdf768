//! Render loop, compositing and export.

pub mod compositor;
pub mod export;
pub mod frame_loop;

pub use compositor::{
    CompositeFrame, Compositor, DrawErrorPolicy, FrameReport, paint_dirty_surfaces,
};
pub use export::{Pixel, flatten, read_pixel};
pub use frame_loop::{FrameCallbackClock, FrameClock, FrameRequest, LoopState, RenderLoop};
