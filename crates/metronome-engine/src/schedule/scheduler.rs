use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;

use crate::core::{
    DrawRegistry, Drawable, FrameCommands, FrameCtx, Host, LoopControl, NullHost, UpdateRegistry,
    Updatable,
};
use crate::time::{FrameClock, FrameTime};

use super::config::{check_steps, ConfigError, SchedulerConfig};
use super::lag::LagTracker;

const SLEEP_SLICE: Duration = Duration::from_millis(1);
const MIN_SLEEP_SLACK: Duration = Duration::from_millis(2);

/// Per-frame scheduler.
///
/// Owns the update and draw registries, the frame clock and the timestep
/// policy. The host calls [`tick`](Self::tick) once per loop iteration; each
/// tick turns the wall-clock time since the previous one into a number of
/// update steps followed by at most one draw pass.
///
/// Single-threaded: participants are `Rc`-shared and callbacks run to
/// completion inside `tick`.
#[derive(Debug)]
pub struct FrameScheduler {
    config: SchedulerConfig,
    clock: FrameClock,

    updatables: UpdateRegistry,
    drawables: DrawRegistry,

    accumulated: Duration,
    time: FrameTime,
    lag: LagTracker,

    should_exit: bool,
    suppress_draw: bool,
    /// The clock was rebased by a first `run` or `run_one_frame`.
    pub(crate) started: bool,
}

impl FrameScheduler {
    /// Creates a scheduler over the wall clock.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, FrameClock::new())
    }

    pub fn with_clock(config: SchedulerConfig, clock: FrameClock) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            updatables: UpdateRegistry::new(),
            drawables: DrawRegistry::new(),
            accumulated: Duration::ZERO,
            time: FrameTime::default(),
            lag: LagTracker::default(),
            should_exit: false,
            suppress_draw: false,
            started: false,
        })
    }

    // ── configuration ─────────────────────────────────────────────────────

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Fails without changing anything if `target` is zero or above the
    /// current max elapsed time.
    pub fn set_target_elapsed(&mut self, target: Duration) -> Result<(), ConfigError> {
        check_steps(target, self.config.max_elapsed)?;
        if target != self.config.target_elapsed {
            log::debug!("target elapsed time {:?} -> {:?}", self.config.target_elapsed, target);
            self.config.target_elapsed = target;
        }
        Ok(())
    }

    /// Fails without changing anything if `max` is below the target elapsed time.
    pub fn set_max_elapsed(&mut self, max: Duration) -> Result<(), ConfigError> {
        check_steps(self.config.target_elapsed, max)?;
        log::debug!("max elapsed time {:?} -> {:?}", self.config.max_elapsed, max);
        self.config.max_elapsed = max;
        Ok(())
    }

    pub fn set_fixed_time_step(&mut self, fixed: bool) {
        log::debug!("fixed time step = {fixed}");
        self.config.fixed_time_step = fixed;
    }

    pub fn set_inactive_sleep(&mut self, sleep: Duration) {
        self.config.inactive_sleep = sleep;
    }

    // ── participants ──────────────────────────────────────────────────────

    pub fn updatables(&self) -> &UpdateRegistry {
        &self.updatables
    }

    pub fn drawables(&self) -> &DrawRegistry {
        &self.drawables
    }

    pub fn add_update_participant(&self, participant: Rc<dyn Updatable>) -> bool {
        self.updatables.add(participant)
    }

    /// `false` if the participant was not registered.
    pub fn remove_update_participant(&self, participant: &Rc<dyn Updatable>) -> bool {
        self.updatables.remove(participant)
    }

    pub fn add_draw_participant(&self, participant: Rc<dyn Drawable>) -> bool {
        self.drawables.add(participant)
    }

    /// `false` if the participant was not registered.
    pub fn remove_draw_participant(&self, participant: &Rc<dyn Drawable>) -> bool {
        self.drawables.remove(participant)
    }

    // ── state ─────────────────────────────────────────────────────────────

    /// Timing of the most recent tick.
    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Time sampled but not yet consumed by an update step.
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    pub fn lag(&self) -> u32 {
        self.lag.lag()
    }

    pub fn is_running_slowly(&self) -> bool {
        self.lag.is_running_slowly()
    }

    // ── control ───────────────────────────────────────────────────────────

    /// Skips the draw pass of the next tick only.
    pub fn suppress_next_draw(&mut self) {
        self.suppress_draw = true;
    }

    /// Same as `FrameCtx::exit`, from outside a callback.
    pub fn request_exit(&mut self) {
        self.should_exit = true;
        self.suppress_draw = true;
    }

    /// Forgets time accumulated so far, e.g. after a debugger pause or a
    /// long load, and clears lag tracking.
    pub fn reset_elapsed_time(&mut self) {
        self.clock.reset();
        self.accumulated = Duration::ZERO;
        self.time.elapsed = Duration::ZERO;
        self.time.is_running_slowly = false;
        self.lag.reset();
    }

    /// Runs one loop iteration with no host hooks.
    pub fn tick(&mut self) -> Result<LoopControl> {
        self.tick_with(&mut NullHost)
    }

    /// Runs one loop iteration.
    ///
    /// Fixed step: waits until at least one step of time has accumulated,
    /// clamps to the max elapsed time, then runs one update pass per whole
    /// step. Variable step: one update pass over the whole clamped delta.
    /// Then one draw pass unless suppressed.
    ///
    /// A participant error aborts the tick and is returned as is.
    pub fn tick_with<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<LoopControl> {
        self.wait_and_sample(host);

        if self.accumulated > self.config.max_elapsed {
            self.accumulated = self.config.max_elapsed;
        }

        if self.config.fixed_time_step {
            let target = self.config.target_elapsed;
            self.time.elapsed = target;

            let mut steps = 0u64;
            let mut stepped = Duration::ZERO;
            while self.accumulated >= target && !self.should_exit {
                self.time.total += target;
                self.accumulated -= target;
                stepped += target;
                steps += 1;
                self.run_update(host, self.time)?;
            }

            self.time.is_running_slowly = self.lag.record(steps);
            self.time.elapsed = stepped;
        } else {
            self.time.elapsed = self.accumulated;
            self.time.total += self.accumulated;
            self.accumulated = Duration::ZERO;
            self.run_update(host, self.time)?;
        }

        if self.suppress_draw {
            log::debug!("draw suppressed for frame {}", self.time.frame_index);
            self.suppress_draw = false;
        } else {
            self.run_draw(host)?;
        }

        let control = if self.should_exit {
            log::debug!("exit requested; stopping after frame {}", self.time.frame_index);
            self.should_exit = false;
            host.exit();
            LoopControl::Exit
        } else {
            LoopControl::Continue
        };

        self.time.frame_index = self.time.frame_index.wrapping_add(1);
        Ok(control)
    }

    fn wait_and_sample<H: Host + ?Sized>(&mut self, host: &mut H) {
        loop {
            if !host.is_active() && self.config.inactive_sleep >= SLEEP_SLICE {
                self.clock.sleep(self.config.inactive_sleep);
            }

            self.accumulated += self.clock.sample();

            let target = self.config.target_elapsed;
            if !self.config.fixed_time_step || self.accumulated >= target {
                return;
            }

            if target - self.accumulated >= MIN_SLEEP_SLACK {
                self.clock.sleep(SLEEP_SLICE);
            } else {
                self.clock.spin();
            }
        }
    }

    /// One update pass over the enabled update participants.
    pub(crate) fn run_update<H: Host + ?Sized>(&mut self, host: &mut H, time: FrameTime) -> Result<()> {
        if !host.before_update(&time) {
            return Ok(());
        }

        let mut commands = FrameCommands::default();
        let result = {
            let mut ctx = FrameCtx::new(time, &self.updatables, &self.drawables, &mut commands);
            self.updatables.for_each_filtered(|u| u.update(&mut ctx))
        };
        self.apply(commands);
        result
    }

    fn run_draw<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        if !host.before_draw(&self.time) {
            return Ok(());
        }

        let mut commands = FrameCommands::default();
        let result = {
            let mut ctx = FrameCtx::new(self.time, &self.updatables, &self.drawables, &mut commands);
            self.drawables.for_each_filtered(|d| d.draw(&mut ctx))
        };
        self.apply(commands);
        result?;

        host.end_draw(&self.time);
        Ok(())
    }

    fn apply(&mut self, commands: FrameCommands) {
        if commands.exit && !self.should_exit {
            log::debug!("exit requested by participant");
        }
        self.should_exit |= commands.exit;
        self.suppress_draw |= commands.suppress_draw;
    }
}
