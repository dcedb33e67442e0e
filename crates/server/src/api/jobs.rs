//! Job API handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use mediagrab_core::{AssetKind, FileRef, Job, JobListing, JobStatus, MediaMetadata};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a URL
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub url: String,
    /// Produce an audio file
    #[serde(default = "default_true")]
    pub extract_audio: bool,
    /// Produce a video file
    #[serde(default = "default_true")]
    pub keep_video: bool,
}

fn default_true() -> bool {
    true
}

/// Response for a submission
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub task_id: String,
    pub message: String,
    pub status_url: String,
}

/// Full status of one job
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub task_id: String,
    pub url: String,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub files: BTreeMap<AssetKind, FileRef>,
    pub video_info: Option<MediaMetadata>,
    pub error: Option<String>,
}

impl From<Job> for StatusResponse {
    fn from(job: Job) -> Self {
        Self {
            task_id: job.id,
            url: job.url,
            status: job.status,
            progress: job.progress,
            message: job.message,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
            files: job.result,
            video_info: job.metadata,
            error: job.error,
        }
    }
}

/// Response for a cancellation
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub task_id: String,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a URL for processing.
///
/// A URL that already has a queued or running job returns that job.
pub async fn process(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let outcome = state
        .orchestrator()
        .submit(body.url.trim(), body.keep_video, body.extract_audio)?;

    let message = if outcome.created {
        "Job accepted, processing started"
    } else {
        "This URL is already being processed"
    };

    Ok(Json(ProcessResponse {
        status_url: format!("/api/status/{}", outcome.job_id),
        task_id: outcome.job_id,
        message: message.to_string(),
    }))
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job = state.orchestrator().status(&task_id)?;
    Ok(Json(StatusResponse::from(job)))
}

/// Cancel and forget a job. Files already produced are left for retention.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    state.orchestrator().cancel(&task_id)?;
    Ok(Json(CancelResponse {
        task_id,
        message: "Job cancelled and removed".to_string(),
    }))
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<JobListing> {
    Json(state.orchestrator().list())
}
