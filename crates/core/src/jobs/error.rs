//! Error types for the job registry.

use thiserror::Error;

use super::types::JobStatus;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The submission was malformed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No job with this id is tracked.
    #[error("job not found: {0}")]
    NotFound(String),

    /// The requested status change would move a job backwards.
    #[error("cannot move job {job_id} from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// The snapshot could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),
}
