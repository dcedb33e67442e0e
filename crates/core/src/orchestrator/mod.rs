//! Job orchestration.
//!
//! The orchestrator is the entry point for job operations. Submitting a URL
//! registers a job and spawns an independent task that drives it:
//!
//! 1. resolve the platform strategy and fetch metadata (10%)
//! 2. acquire assets through the fallback cascade (20% .. 70%)
//! 3. rename files to human-readable names (90%)
//! 4. record the result (100%)
//!
//! Each job owns its task; no job blocks another. Cancellation untracks the
//! job in the registry and detaches its task, whose later updates are then
//! rejected and discarded.

mod naming;
mod runner;
mod tasks;
mod types;

pub use naming::{published_name, sanitize_title, short_id};
pub use runner::JobOrchestrator;
pub use tasks::TaskTracker;
pub use types::JobListing;
