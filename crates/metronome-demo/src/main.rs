use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use anyhow::{Context, Result};
use metronome_engine::core::{Drawable, FrameCtx, Host, Slot, Updatable};
use metronome_engine::logging::{init_logging, LoggingConfig};
use metronome_engine::schedule::{FrameScheduler, SchedulerConfig};
use metronome_engine::time::FrameTime;

/// Simulated time after which the demo stops itself.
const RUN_FOR: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = SchedulerConfig::default().with_max_elapsed(Duration::from_millis(250));
    let mut scheduler = FrameScheduler::new(config).context("invalid scheduler config")?;

    let orbit = Rc::new(Orbit::new());
    let beacon = Rc::new(Beacon {
        slot: Slot::new(true, 10),
    });

    scheduler.add_update_participant(Rc::new(Stopwatch {
        slot: Slot::new(true, i32::MIN),
    }));
    scheduler.add_update_participant(orbit.clone());
    scheduler.add_update_participant(Rc::new(Spawner {
        slot: Slot::new(true, 5),
        every: 30,
        seen: Cell::new(0),
        beacon: beacon.clone(),
    }));
    scheduler.add_draw_participant(orbit.clone());
    scheduler.add_draw_participant(beacon);

    let mut host = ConsoleHost::default();
    scheduler.run(&mut host)?;

    log::info!(
        "done: {} draws presented, orbit angle {:.3} rad",
        host.presented,
        orbit.angle.get()
    );
    Ok(())
}

/// Asks the loop to stop once enough simulated time has passed.
struct Stopwatch {
    slot: Slot,
}

impl Updatable for Stopwatch {
    fn update_slot(&self) -> &Slot {
        &self.slot
    }

    fn update(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        if ctx.time.total >= RUN_FOR {
            ctx.exit();
        }
        Ok(())
    }
}

/// Integrates an angle every step and draws it.
struct Orbit {
    update: Slot,
    draw: Slot,
    angle: Cell<f32>,
}

impl Orbit {
    fn new() -> Self {
        Self {
            update: Slot::new(true, 0),
            draw: Slot::new(true, 0),
            angle: Cell::new(0.0),
        }
    }
}

impl Updatable for Orbit {
    fn update_slot(&self) -> &Slot {
        &self.update
    }

    fn update(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let angle = self.angle.get() + ctx.time.dt() * std::f32::consts::PI;
        self.angle.set(angle % std::f32::consts::TAU);
        Ok(())
    }
}

impl Drawable for Orbit {
    fn draw_slot(&self) -> &Slot {
        &self.draw
    }

    fn draw(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        if ctx.time.frame_index % 30 == 0 {
            log::info!(
                "frame {:>4}  total {:>7.3}s  step x{}  angle {:.3}{}",
                ctx.time.frame_index,
                ctx.time.total.as_secs_f32(),
                ctx.time.elapsed.as_nanos() / SchedulerConfig::DEFAULT_TARGET_ELAPSED.as_nanos(),
                self.angle.get(),
                if ctx.time.is_running_slowly { "  (running slowly)" } else { "" },
            );
        }
        Ok(())
    }
}

/// Blinks by toggling its own visibility from inside the draw pass.
struct Beacon {
    slot: Slot,
}

impl Drawable for Beacon {
    fn draw_slot(&self) -> &Slot {
        &self.slot
    }

    fn draw(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        log::trace!("beacon on at frame {}", ctx.time.frame_index);
        // Hidden from the next pass on; the spawner turns it back on.
        self.slot.set_included(false);
        Ok(())
    }
}

/// Periodically adds a short-lived participant and shows the beacon again.
struct Spawner {
    slot: Slot,
    every: u32,
    seen: Cell<u32>,
    beacon: Rc<Beacon>,
}

impl Updatable for Spawner {
    fn update_slot(&self) -> &Slot {
        &self.slot
    }

    fn update(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let seen = self.seen.get() + 1;
        self.seen.set(seen);
        if seen % self.every != 0 {
            return Ok(());
        }

        ctx.updatables.add(Spark::new(3));
        self.beacon.slot.set_included(true);
        Ok(())
    }
}

/// Lives for a few steps, then removes itself.
struct Spark {
    slot: Slot,
    remaining: Cell<u32>,
    me: Weak<Spark>,
}

impl Spark {
    fn new(steps: u32) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            // Ahead of everything but the stopwatch.
            slot: Slot::new(true, -1),
            remaining: Cell::new(steps),
            me: me.clone(),
        })
    }
}

impl Updatable for Spark {
    fn update_slot(&self) -> &Slot {
        &self.slot
    }

    fn update(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        if remaining == 0 {
            if let Some(me) = self.me.upgrade() {
                let me: Rc<dyn Updatable> = me;
                ctx.updatables.remove(&me);
                log::debug!("spark expired at {:.3}s", ctx.time.total.as_secs_f32());
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct ConsoleHost {
    presented: u64,
}

impl Host for ConsoleHost {
    fn begin_run(&mut self) {
        log::info!("demo running for {:?} of simulated time", RUN_FOR);
    }

    fn end_draw(&mut self, _time: &FrameTime) {
        self.presented += 1;
    }

    fn exit(&mut self) {
        log::info!("exit requested after {} presented frames", self.presented);
    }

    fn end_run(&mut self) {
        log::debug!("console host released");
    }
}
