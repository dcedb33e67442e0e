//! Job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::acquisition::OutputSelection;
use crate::extractor::{AssetKind, MediaMetadata};

/// Opaque job identifier (a UUID string).
pub type JobId = String;

/// Lifecycle status of a job. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns the status type as a string (for filtering and labels).
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Whether a job in this status may move to `next`.
    ///
    /// Staying in a non-terminal status is allowed (progress updates).
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == *self || next.rank() > self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A produced file, exposed through the download endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_name: String,
    pub download_url: String,
}

impl FileRef {
    pub fn new(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            download_url: format!("/api/download/{}", file_name),
            file_name,
        }
    }
}

/// A job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub url: String,
    pub want_video: bool,
    pub want_audio: bool,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    #[serde(default)]
    pub result: BTreeMap<AssetKind, FileRef>,
    #[serde(default)]
    pub metadata: Option<MediaMetadata>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub(crate) fn new(id: JobId, url: String, want_video: bool, want_audio: bool) -> Self {
        let now = Utc::now();
        Self {
            id,
            url,
            want_video,
            want_audio,
            status: JobStatus::Queued,
            progress: 0,
            message: "Queued".to_string(),
            result: BTreeMap::new(),
            metadata: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// The asset selection this job asked for.
    pub fn selection(&self) -> Option<OutputSelection> {
        OutputSelection::from_flags(self.want_video, self.want_audio)
    }
}

/// Condensed view of a job for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub title: Option<String>,
    pub files: BTreeMap<AssetKind, FileRef>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            url: job.url.clone(),
            status: job.status,
            progress: job.progress,
            message: job.message.clone(),
            title: job.metadata.as_ref().map(|m| m.title.clone()),
            files: job.result.clone(),
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub job_id: JobId,
    /// False when an in-flight job for the same URL was returned instead.
    pub created: bool,
}

/// Persisted form of the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub jobs: BTreeMap<JobId, Job>,
}
