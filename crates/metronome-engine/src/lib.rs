//! Metronome engine crate.
//!
//! A deterministic, reentrancy-safe per-frame scheduler: a fixed/variable
//! timestep loop over two ordered, filtered participant registries.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`registry`] | `Registry`, `SortFilter`, `Signal` |
//! | [`time`] | `FrameClock`, `FrameTime`, time sources |
//! | [`core`] | `Updatable`, `Drawable`, `Slot`, `FrameCtx`, `Host` |
//! | [`schedule`] | `FrameScheduler`, `SchedulerConfig`, `LagTracker`, run modes |
//! | [`logging`] | `init_logging` |
//!
//! # Quick start
//!
//! ```rust
//! use std::rc::Rc;
//! use metronome_engine::core::{FrameCtx, Slot, Updatable};
//! use metronome_engine::schedule::{FrameScheduler, SchedulerConfig};
//!
//! struct Ticker { slot: Slot }
//!
//! impl Updatable for Ticker {
//!     fn update_slot(&self) -> &Slot { &self.slot }
//!     fn update(&self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
//!         ctx.exit();
//!         Ok(())
//!     }
//! }
//!
//! let mut scheduler = FrameScheduler::new(SchedulerConfig::default()).unwrap();
//! scheduler.add_update_participant(Rc::new(Ticker { slot: Slot::default() }));
//! scheduler.run(&mut metronome_engine::core::NullHost).unwrap();
//! ```

pub mod core;
pub mod logging;
pub mod registry;
pub mod schedule;
pub mod time;
