use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{files, handlers, jobs, middleware::metrics_middleware, storage};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Jobs
        .route("/process", post(jobs::process))
        .route("/status/{task_id}", get(jobs::status))
        .route("/tasks", get(jobs::list))
        .route("/tasks/{task_id}", delete(jobs::cancel))
        // Files
        .route("/download/{file_id}", get(files::download))
        // Storage
        .route("/storage/info", get(storage::info))
        .route("/storage/cleanup", post(storage::cleanup));

    Router::new()
        .route("/", get(handlers::root))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
