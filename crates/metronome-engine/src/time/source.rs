use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
///
/// `now()` is measured from an arbitrary fixed origin and never decreases.
/// `sleep` and `spin` are pacing hints used by the scheduler while it waits for
/// enough time to accumulate; they have no effect on correctness.
pub trait TimeSource {
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Called instead of `sleep` when the remaining wait is too short to sleep on.
    fn spin(&self) {
        std::hint::spin_loop();
    }
}

/// Wall-clock source backed by `Instant`.
#[derive(Debug, Copy, Clone)]
pub struct MonotonicSource {
    origin: Instant,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Host-driven time source.
///
/// Time only moves when [`advance`](Self::advance) is called, or when the
/// scheduler waits on it: `sleep(d)` advances by `d` and `spin()` by
/// [`SPIN_QUANTUM`](Self::SPIN_QUANTUM). Clones share the same timeline, so a
/// host can keep one handle and give another to the clock.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    nanos: Arc<AtomicU64>,
}

impl ManualSource {
    pub const SPIN_QUANTUM: Duration = Duration::from_micros(100);

    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(by, Ordering::Relaxed);
    }

    /// Current reading.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> Duration {
        self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn spin(&self) {
        self.advance(Self::SPIN_QUANTUM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clones_share_timeline() {
        let a = ManualSource::new();
        let b = a.clone();
        a.advance(Duration::from_millis(5));
        assert_eq!(b.now(), Duration::from_millis(5));
    }

    #[test]
    fn manual_sleep_and_spin_advance() {
        let s = ManualSource::new();
        s.sleep(Duration::from_millis(1));
        s.spin();
        assert_eq!(s.now(), Duration::from_millis(1) + ManualSource::SPIN_QUANTUM);
    }

    #[test]
    fn monotonic_never_decreases() {
        let s = MonotonicSource::new();
        let a = s.now();
        let b = s.now();
        assert!(b >= a);
    }
}
