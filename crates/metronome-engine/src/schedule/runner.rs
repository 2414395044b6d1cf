use std::thread::JoinHandle;

use anyhow::{Context, Result};

use crate::core::{Host, LoopControl};
use crate::time::FrameTime;

use super::scheduler::FrameScheduler;

impl FrameScheduler {
    /// Runs the loop on the calling thread until a tick returns
    /// [`LoopControl::Exit`] or a participant fails.
    ///
    /// Time spent before the call is not counted: the clock restarts here.
    /// Before the first tick, update participants get one priming pass with
    /// zero time so they are initialized before anything is drawn.
    pub fn run<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        log::info!(
            "frame loop starting (fixed_time_step = {}, target = {:?})",
            self.config().fixed_time_step,
            self.config().target_elapsed
        );

        host.begin_run();
        self.reset_elapsed_time();
        self.started = true;

        self.run_update(host, FrameTime::default())?;

        loop {
            if self.tick_with(host)? == LoopControl::Exit {
                break;
            }
        }

        host.end_run();
        log::info!("frame loop stopped after {} ticks", self.time().frame_index);
        Ok(())
    }

    /// Runs exactly one tick between the host's run hooks.
    ///
    /// The first call restarts the clock; later calls measure from the
    /// previous tick.
    pub fn run_one_frame<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<LoopControl> {
        if !self.started {
            self.reset_elapsed_time();
            self.started = true;
        }

        host.begin_run();
        let control = self.tick_with(host)?;
        host.end_run();
        Ok(control)
    }
}

/// Runs a frame loop on a dedicated thread.
///
/// Participants are `Rc`-shared and cannot cross threads, so the scheduler and
/// its host are built by `build` on the new thread, then driven with
/// [`FrameScheduler::run`]. The join handle yields the loop's result.
pub fn spawn<H, F>(name: impl Into<String>, build: F) -> Result<JoinHandle<Result<()>>>
where
    H: Host + 'static,
    F: FnOnce() -> Result<(FrameScheduler, H)> + Send + 'static,
{
    let name = name.into();
    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let (mut scheduler, mut host) = build().context("failed to build frame loop")?;
            scheduler.run(&mut host)
        })
        .with_context(|| format!("failed to spawn frame loop thread '{name}'"))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::core::{FrameCtx, NullHost, Slot, Updatable};
    use crate::schedule::SchedulerConfig;
    use crate::time::{FrameClock, ManualSource};

    /// Records hook calls in order.
    #[derive(Default)]
    struct Journal {
        calls: Vec<&'static str>,
    }

    impl Host for Journal {
        fn begin_run(&mut self) {
            self.calls.push("begin");
        }

        fn end_draw(&mut self, _time: &FrameTime) {
            self.calls.push("draw");
        }

        fn exit(&mut self) {
            self.calls.push("exit");
        }

        fn end_run(&mut self) {
            self.calls.push("end");
        }
    }

    struct StopAfter {
        slot: Slot,
        limit: u32,
        updates: Cell<u32>,
        first_elapsed: Cell<Option<Duration>>,
    }

    impl StopAfter {
        fn new(limit: u32) -> Rc<Self> {
            Rc::new(Self {
                slot: Slot::default(),
                limit,
                updates: Cell::new(0),
                first_elapsed: Cell::new(None),
            })
        }
    }

    impl Updatable for StopAfter {
        fn update_slot(&self) -> &Slot {
            &self.slot
        }

        fn update(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
            if self.first_elapsed.get().is_none() {
                self.first_elapsed.set(Some(ctx.time.elapsed));
            }
            self.updates.set(self.updates.get() + 1);
            if self.updates.get() >= self.limit {
                ctx.exit();
            }
            Ok(())
        }
    }

    fn manual_scheduler() -> FrameScheduler {
        manual_scheduler_with(ManualSource::new())
    }

    fn manual_scheduler_with(src: ManualSource) -> FrameScheduler {
        let cfg = SchedulerConfig::default().with_target_elapsed(Duration::from_millis(10));
        FrameScheduler::with_clock(cfg, FrameClock::with_source(src)).expect("valid config")
    }

    #[test]
    fn run_primes_then_ticks_until_exit() {
        let mut s = manual_scheduler();
        let stopper = StopAfter::new(4);
        s.add_update_participant(stopper.clone());

        s.run(&mut NullHost).unwrap();

        assert_eq!(stopper.first_elapsed.get(), Some(Duration::ZERO));
        assert_eq!(stopper.updates.get(), 4);
        // Priming pass plus three ticks of one step each.
        assert_eq!(s.time().frame_index, 3);
    }

    #[test]
    fn run_one_frame_ticks_once() {
        let mut s = manual_scheduler();
        let stopper = StopAfter::new(100);
        s.add_update_participant(stopper.clone());

        assert_eq!(s.run_one_frame(&mut NullHost).unwrap(), LoopControl::Continue);
        assert_eq!(stopper.updates.get(), 1);
        assert_eq!(s.time().frame_index, 1);
    }

    #[test]
    fn run_ignores_time_spent_before_it_starts() {
        let src = ManualSource::new();
        let mut s = manual_scheduler_with(src.clone());
        let stopper = StopAfter::new(2);
        s.add_update_participant(stopper.clone());

        src.advance(Duration::from_secs(3));
        s.run(&mut NullHost).unwrap();

        // Priming pass plus a single step, no catch-up burst.
        assert_eq!(stopper.updates.get(), 2);
        assert_eq!(s.time().total, Duration::from_millis(10));
        assert_eq!(s.lag(), 0);
        assert!(!s.is_running_slowly());
    }

    #[test]
    fn run_calls_hooks_around_the_loop() {
        let mut s = manual_scheduler();
        s.add_update_participant(StopAfter::new(3));

        let mut host = Journal::default();
        s.run(&mut host).unwrap();

        // The exit tick's draw is suppressed.
        assert_eq!(host.calls, vec!["begin", "draw", "exit", "end"]);
    }

    #[test]
    fn run_skips_end_hook_on_error() {
        struct Broken {
            slot: Slot,
        }

        impl Updatable for Broken {
            fn update_slot(&self) -> &Slot {
                &self.slot
            }

            fn update(&self, _ctx: &mut FrameCtx<'_>) -> Result<()> {
                anyhow::bail!("broken participant")
            }
        }

        let mut s = manual_scheduler();
        s.add_update_participant(Rc::new(Broken { slot: Slot::default() }));

        let mut host = Journal::default();
        assert!(s.run(&mut host).is_err());
        assert_eq!(host.calls, vec!["begin"]);
    }

    #[test]
    fn run_one_frame_wraps_tick_in_hooks() {
        let mut s = manual_scheduler();
        s.add_update_participant(StopAfter::new(100));

        let mut host = Journal::default();
        s.run_one_frame(&mut host).unwrap();
        s.run_one_frame(&mut host).unwrap();
        assert_eq!(host.calls, vec!["begin", "draw", "end", "begin", "draw", "end"]);
    }

    #[test]
    fn run_one_frame_rebases_clock_only_once() {
        let src = ManualSource::new();
        let mut s = manual_scheduler_with(src.clone());
        let stopper = StopAfter::new(100);
        s.add_update_participant(stopper.clone());

        src.advance(Duration::from_secs(3));
        s.run_one_frame(&mut NullHost).unwrap();
        assert_eq!(stopper.updates.get(), 1);

        src.advance(Duration::from_millis(30));
        s.run_one_frame(&mut NullHost).unwrap();
        assert_eq!(stopper.updates.get(), 4);
    }

    #[test]
    fn spawned_loop_runs_to_completion() {
        let handle = spawn("test-loop", || {
            let s = manual_scheduler();
            s.add_update_participant(StopAfter::new(5));
            Ok((s, NullHost))
        })
        .unwrap();

        handle.join().expect("loop thread panicked").unwrap();
    }

    #[test]
    fn spawned_build_error_is_returned() {
        let handle = spawn("failing-loop", || -> Result<(FrameScheduler, NullHost)> {
            anyhow::bail!("no scheduler today")
        })
        .unwrap();

        let err = handle.join().expect("loop thread panicked").unwrap_err();
        assert!(format!("{err:#}").contains("no scheduler today"));
    }
}
