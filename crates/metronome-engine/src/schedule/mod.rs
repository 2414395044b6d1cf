//! Frame scheduling.
//!
//! [`FrameScheduler`] converts elapsed wall-clock time into update steps and
//! draw passes over its two registries. [`LagTracker`] holds the
//! running-slowly policy; [`SchedulerConfig`] the timestep knobs; the run
//! helpers in this module drive repeated ticks.

mod config;
mod lag;
mod runner;
mod scheduler;

pub use config::{ConfigError, SchedulerConfig};
pub use lag::LagTracker;
pub use runner::spawn;
pub use scheduler::FrameScheduler;
