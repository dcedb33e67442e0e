//! Storage inspection and manual retention handlers.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use mediagrab_core::{CleanupOutcome, StorageInfo};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StorageInfoResponse {
    pub status: &'static str,
    pub storage: StorageInfo,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub status: &'static str,
    pub cleanup_result: CleanupOutcome,
    pub timestamp: String,
}

pub async fn info(State(state): State<Arc<AppState>>) -> Result<Json<StorageInfoResponse>, ApiError> {
    let storage = state.retention().storage_info().await?;
    Ok(Json(StorageInfoResponse {
        status: "success",
        storage,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Run one retention pass now, regardless of the schedule.
pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<CleanupResponse>, ApiError> {
    let outcome = state.retention().run_pass().await?;
    info!(outcome = outcome.label(), "Manual cleanup finished");
    Ok(Json(CleanupResponse {
        status: "success",
        cleanup_result: outcome,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
