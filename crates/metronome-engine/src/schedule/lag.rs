/// Tracks how far the fixed-step loop is behind real time.
///
/// Each tick that needed `n > 1` steps adds `n - 1` to the lag; each tick that
/// needed exactly one step pays one back. The running-slowly flag turns on at
/// [`SLOW_THRESHOLD`](Self::SLOW_THRESHOLD) and only turns off again at zero.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct LagTracker {
    lag: u32,
    running_slowly: bool,
}

impl LagTracker {
    pub const SLOW_THRESHOLD: u32 = 5;

    /// Accounts for one tick that executed `steps` fixed steps and returns
    /// the running-slowly flag for that tick.
    pub fn record(&mut self, steps: u64) -> bool {
        let extra = u32::try_from(steps.saturating_sub(1)).unwrap_or(u32::MAX);
        self.lag = self.lag.saturating_add(extra);

        if self.running_slowly {
            if self.lag == 0 {
                self.running_slowly = false;
                log::info!("frame scheduler caught up");
            }
        } else if self.lag >= Self::SLOW_THRESHOLD {
            self.running_slowly = true;
            log::warn!("frame scheduler running slowly (lag = {} steps)", self.lag);
        }

        if steps == 1 && self.lag > 0 {
            self.lag -= 1;
        }

        self.running_slowly
    }

    #[inline]
    pub fn lag(&self) -> u32 {
        self.lag
    }

    #[inline]
    pub fn is_running_slowly(&self) -> bool {
        self.running_slowly
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_steps_accumulate() {
        let mut lag = LagTracker::default();
        lag.record(3);
        assert_eq!(lag.lag(), 2);
        lag.record(2);
        assert_eq!(lag.lag(), 3);
        assert!(!lag.is_running_slowly());
    }

    #[test]
    fn lag_of_four_is_not_slow() {
        let mut lag = LagTracker::default();
        assert!(!lag.record(5));
        assert_eq!(lag.lag(), 4);
    }

    #[test]
    fn single_steps_recover_gradually() {
        let mut lag = LagTracker::default();
        lag.record(4);
        lag.record(1);
        assert_eq!(lag.lag(), 2);
        lag.record(1);
        lag.record(1);
        lag.record(1);
        assert_eq!(lag.lag(), 0);
    }

    #[test]
    fn hysteresis_holds_until_zero() {
        let mut lag = LagTracker::default();
        assert!(lag.record(6));
        assert_eq!(lag.lag(), 5);

        // Partial recovery keeps the flag on.
        for expected in (0..5).rev() {
            assert!(lag.record(1));
            assert_eq!(lag.lag(), expected);
        }
        // Observed at zero on the following tick.
        assert!(!lag.record(1));
    }

    #[test]
    fn spike_after_partial_recovery_stays_slow() {
        let mut lag = LagTracker::default();
        lag.record(8);
        lag.record(1);
        lag.record(1);
        assert!(lag.record(2));
        assert!(lag.is_running_slowly());
    }

    #[test]
    fn zero_steps_change_nothing() {
        let mut lag = LagTracker::default();
        lag.record(3);
        lag.record(0);
        assert_eq!(lag.lag(), 2);
    }

    #[test]
    fn huge_step_counts_saturate() {
        let mut lag = LagTracker::default();
        assert!(lag.record(u64::from(u32::MAX) + 10));
        assert_eq!(lag.lag(), u32::MAX);
        assert!(lag.record(2));
        assert_eq!(lag.lag(), u32::MAX);
    }
}
