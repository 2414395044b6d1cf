use std::time::Duration;

/// Rejected timestep configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("target elapsed time must be positive and non-zero")]
    ZeroTargetElapsed,

    #[error("max elapsed time {max:?} must be at least the target elapsed time {target:?}")]
    MaxBelowTarget { max: Duration, target: Duration },
}

/// Timestep policy of a [`FrameScheduler`](super::FrameScheduler).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SchedulerConfig {
    /// Duration of one fixed update step.
    pub target_elapsed: Duration,
    /// Ceiling on the time processed by one tick. Bounds catch-up after a stall.
    pub max_elapsed: Duration,
    /// Fixed steps when `true`, one variable step per tick otherwise.
    pub fixed_time_step: bool,
    /// Sleep applied at the start of each tick while the host is inactive.
    /// Values under one millisecond disable it.
    pub inactive_sleep: Duration,
}

impl SchedulerConfig {
    /// 1/60 s.
    pub const DEFAULT_TARGET_ELAPSED: Duration = Duration::from_nanos(16_666_667);
    pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_millis(500);
    pub const DEFAULT_INACTIVE_SLEEP: Duration = Duration::from_millis(20);

    pub fn with_target_elapsed(mut self, target: Duration) -> Self {
        self.target_elapsed = target;
        self
    }

    pub fn with_max_elapsed(mut self, max: Duration) -> Self {
        self.max_elapsed = max;
        self
    }

    pub fn with_fixed_time_step(mut self, fixed: bool) -> Self {
        self.fixed_time_step = fixed;
        self
    }

    pub fn with_inactive_sleep(mut self, sleep: Duration) -> Self {
        self.inactive_sleep = sleep;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_steps(self.target_elapsed, self.max_elapsed)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_elapsed: Self::DEFAULT_TARGET_ELAPSED,
            max_elapsed: Self::DEFAULT_MAX_ELAPSED,
            fixed_time_step: true,
            inactive_sleep: Self::DEFAULT_INACTIVE_SLEEP,
        }
    }
}

pub(crate) fn check_steps(target: Duration, max: Duration) -> Result<(), ConfigError> {
    if target.is_zero() {
        return Err(ConfigError::ZeroTargetElapsed);
    }
    if max < target {
        return Err(ConfigError::MaxBelowTarget { max, target });
    }
    Ok(())
}
