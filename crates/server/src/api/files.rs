//! File download handler.

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue},
    response::Response,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

use mediagrab_core::resolve_download;

use super::error::ApiError;
use crate::state::AppState;

/// Stream a published file from the output directory as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let served = resolve_download(state.output_dir(), &file_id)?;
    debug!(file = %served.file_name, "Serving file");

    let response = match ServeFile::new(&served.path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new);

    // Error and not-modified bodies are not the file.
    if response.status().is_success() {
        set_attachment_headers(&mut response, served.content_type, &served.file_name);
    }

    Ok(response)
}

fn set_attachment_headers(response: &mut Response, content_type: &'static str, file_name: &str) {
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    );
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => warn!(file = %file_name, error = %e, "Invalid Content-Disposition"),
    }
}
