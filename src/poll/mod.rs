// ABOUTME: Poll scheduler: adaptive fallback fetching when the push stream is down.
// ABOUTME: Exports the cadence policy, activity tracker, and scheduler.

mod cadence;
mod scheduler;

pub use cadence::{Activity, ActivityTracker, Cadence, CadencePolicy};
pub use scheduler::PollScheduler;

/// Poll fetches allowed in flight at once; ticks beyond this are skipped.
pub const MAX_IN_FLIGHT_FETCHES: usize = 2;
