use std::fmt;
use std::time::Duration;

use super::source::{MonotonicSource, TimeSource};

/// Frame clock producing elapsed-since-last-sample deltas.
///
/// `FrameClock` is owned by one scheduler so that independent loops do not
/// share delta-time state. It does not clamp; bounding catch-up is the
/// scheduler's policy.
pub struct FrameClock {
    source: Box<dyn TimeSource>,
    last: Duration,
}

impl FrameClock {
    /// Creates a clock over the wall clock.
    pub fn new() -> Self {
        Self::with_source(MonotonicSource::new())
    }

    /// Creates a clock over a custom time source. The baseline is the source's
    /// current reading.
    pub fn with_source(source: impl TimeSource + 'static) -> Self {
        let last = source.now();
        Self {
            source: Box::new(source),
            last,
        }
    }

    /// Resets the clock baseline.
    ///
    /// Useful after a debugger pause or when resuming from suspension.
    pub fn reset(&mut self) {
        self.last = self.source.now();
    }

    /// Returns the time elapsed since the previous sample (or reset) and
    /// moves the baseline to now.
    pub fn sample(&mut self) -> Duration {
        let now = self.source.now();
        let dt = now.saturating_sub(self.last);
        self.last = now;
        dt
    }

    #[inline]
    pub fn sleep(&self, duration: Duration) {
        self.source.sleep(duration);
    }

    #[inline]
    pub fn spin(&self) {
        self.source.spin();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameClock").field("last", &self.last).finish_non_exhaustive()
    }
}
