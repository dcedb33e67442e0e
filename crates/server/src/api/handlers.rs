use axum::{extract::State, http::header, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use mediagrab_core::SanitizedConfig;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Service version reported by the root endpoint.
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub active_jobs: usize,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "mediagrab",
        "version": VERSION,
        "description": "Video download and audio extraction service",
        "endpoints": {
            "process": "POST /api/process",
            "status": "GET /api/status/{task_id}",
            "download": "GET /api/download/{file_id}",
            "tasks": "GET /api/tasks",
            "cancel": "DELETE /api/tasks/{task_id}",
            "storage_info": "GET /api/storage/info",
            "storage_cleanup": "POST /api/storage/cleanup",
            "health": "GET /api/health",
        },
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        active_jobs: state.orchestrator().active_jobs(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
