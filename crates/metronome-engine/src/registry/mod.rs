//! Participant registries.
//!
//! A [`Registry`] keeps shared participants sorted by a mutable order key and
//! filtered by a mutable inclusion flag, and stays correct while participants
//! mutate it (or themselves) from inside a traversal.
//!
//! # How it stays consistent
//!
//! 1. `add`, `remove` and order-changed signals only append to a journal.
//! 2. The next traversal merges the journal into canonical storage: removals by
//!    descending index, then a single stable merge of the sorted adds.
//! 3. The filtered view is rebuilt from canonical storage and lent to the
//!    traversal. If anything changed while it was out, it is discarded on return.
//!
//! Filtering and ordering keys are read through a [`SortFilter`] implementation,
//! and change notification goes through [`Signal`].

mod collection;
mod journal;
mod policy;
mod signal;

pub use collection::Registry;
pub use policy::SortFilter;
pub use signal::{Signal, SubscriptionId};
