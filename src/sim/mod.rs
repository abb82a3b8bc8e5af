//! Discrete-event clock and scheduler
//!
//! Virtual time only moves when the scheduler pops the next queued event.
//! Events scheduled for the same instant run in the order they were scheduled.

pub mod error;
pub mod scheduler;
pub mod types;

pub use error::{SimError, SimResult};
pub use scheduler::{Callback, Scheduler};
pub use types::{DataRate, EventId, SimTime};
