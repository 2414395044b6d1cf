//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the scheduler.
//! Intended usage:
//! - one `FrameClock` per scheduler, over a `TimeSource`
//! - call `sample()` once per tick to obtain the time elapsed since the previous sample
//! - `ManualSource` replaces the wall clock for headless hosts and tests

mod frame_clock;
mod frame_time;
mod source;

pub use frame_clock::FrameClock;
pub use frame_time::FrameTime;
pub use source::{ManualSource, MonotonicSource, TimeSource};
