//! Types for the job orchestrator.

use serde::Serialize;

use crate::jobs::JobSummary;

/// Snapshot of all jobs plus live counters.
#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    /// Job tasks currently executing.
    pub active_jobs: usize,
    /// URLs with a non-terminal job.
    pub in_flight_urls: usize,
    /// All tracked jobs.
    pub total_jobs: usize,
    pub jobs: Vec<JobSummary>,
}
