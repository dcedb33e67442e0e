//! Attempt identifiers.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::extractor::AssetKind;

/// Issues a distinct output stem for every attempt within one job.
///
/// Stems look like `video_<scope>_01`; the counter is shared across kinds so
/// no two attempts of a job ever produce the same file name.
#[derive(Debug)]
pub struct AttemptIds {
    scope: String,
    next: AtomicU32,
}

impl AttemptIds {
    /// Creates a generator scoped to a job.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            next: AtomicU32::new(1),
        }
    }

    /// Creates a generator scoped to a job id, dropping dashes.
    pub fn for_job(job_id: &str) -> Self {
        Self::new(job_id.replace('-', ""))
    }

    /// Returns the next stem for an asset kind.
    pub fn next(&self, kind: AssetKind) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}_{:02}", kind.as_str(), self.scope, n)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}
