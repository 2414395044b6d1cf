use std::time::Duration;

/// Frame timing snapshot handed to update and draw participants.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameTime {
    /// Time covered by the current callback.
    ///
    /// Fixed step: one target step while updating; `target * n` at draw time.
    /// Variable step: the whole clamped delta.
    pub elapsed: Duration,

    /// Simulated time since the scheduler started (or was reset).
    pub total: Duration,

    /// Set while the scheduler is persistently behind real time.
    pub is_running_slowly: bool,

    /// Monotonic tick counter.
    pub frame_index: u64,
}

impl FrameTime {
    /// `elapsed` in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
