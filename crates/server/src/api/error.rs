//! Mapping of core errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use mediagrab_core::{FileAccessError, RegistryError, RetentionError};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Registry(RegistryError),
    File(FileAccessError),
    Retention(RetentionError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Registry(RegistryError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::File(FileAccessError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            ApiError::File(FileAccessError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Retention(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Registry(e) => e.to_string(),
            ApiError::File(e) => e.to_string(),
            ApiError::Retention(e) => e.to_string(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        ApiError::Registry(e)
    }
}

impl From<FileAccessError> for ApiError {
    fn from(e: FileAccessError) -> Self {
        ApiError::File(e)
    }
}

impl From<RetentionError> for ApiError {
    fn from(e: RetentionError) -> Self {
        ApiError::Retention(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self.message(), "Request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
