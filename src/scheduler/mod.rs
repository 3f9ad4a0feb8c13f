//! The retention scheduler.
//!
//! A single task owns the [`ResourceStore`](crate::resources::ResourceStore)
//! and multiplexes three timers and a cancellation token:
//!
//! - **refresh** (hourly): list remote resources and merge them into the store
//! - **sweep** (every minute): delete expired resources remotely, then locally
//! - **keep-alive** (every minute): fire a detached self-ping
//!
//! Refresh and sweep run inline on the scheduler task, so they never overlap
//! and the store needs no lock.

mod outcome;
mod state;
mod worker;

pub use outcome::{RefreshOutcome, RunSummary, SweepOutcome};
pub use state::{Cadences, SchedulerState, SweepOptions};
pub use worker::Scheduler;
