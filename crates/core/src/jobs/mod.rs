//! Job registry: the authoritative record of every job.
//!
//! The registry owns job records and the in-flight URL index used for
//! deduplication. All mutations go through one lock, and every mutation is
//! followed by a snapshot write to a [`SnapshotStore`].

mod error;
mod registry;
mod snapshot;
mod types;

pub use error::RegistryError;
pub use registry::JobRegistry;
pub use snapshot::{JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use types::{FileRef, Job, JobId, JobSnapshot, JobStatus, JobSummary, SubmitOutcome};
