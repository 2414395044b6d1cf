//! Core scheduler-facing contracts.
//!
//! This module defines the stable interface between the frame scheduler and
//! the code it drives: what an update or draw participant looks like, what a
//! participant sees during its callback, and what the host loop may hook.

mod ctx;
mod host;
mod participant;

pub use ctx::FrameCtx;
pub(crate) use ctx::FrameCommands;
pub use host::{Host, LoopControl, NullHost};
pub use participant::{DrawPolicy, Drawable, Slot, UpdatePolicy, Updatable};

use crate::registry::Registry;

/// Registry of update participants.
pub type UpdateRegistry = Registry<UpdatePolicy>;

/// Registry of draw participants.
pub type DrawRegistry = Registry<DrawPolicy>;
