use crate::time::FrameTime;

/// Control directive returned by each scheduler tick.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Hooks the driving loop may provide. Every method has a neutral default.
pub trait Host {
    /// Called when `run` or `run_one_frame` starts, before any update.
    fn begin_run(&mut self) {}

    /// Called when `run` stops on an exit request, and after each
    /// `run_one_frame`. Not called when a participant error aborts the run.
    fn end_run(&mut self) {}

    /// While `false`, each tick first sleeps for the configured inactive time.
    fn is_active(&self) -> bool {
        true
    }

    /// Called before each update step. Returning `false` skips that step's
    /// participants (time still advances).
    fn before_update(&mut self, time: &FrameTime) -> bool {
        let _ = time;
        true
    }

    /// Called before the draw pass. Returning `false` skips drawing this tick.
    fn before_draw(&mut self, time: &FrameTime) -> bool {
        let _ = time;
        true
    }

    /// Called after all draw participants ran, e.g. to present.
    fn end_draw(&mut self, time: &FrameTime) {
        let _ = time;
    }

    /// Called once when an exit request takes effect.
    fn exit(&mut self) {}
}

/// Host that accepts every default.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullHost;

impl Host for NullHost {}
