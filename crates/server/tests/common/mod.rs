//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock extractor and transcoder injected, so the full job flow runs
//! without yt-dlp or ffmpeg installed.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediagrab_core::{
    testing::{MockExtractor, MockTranscoder},
    Config, JobOrchestrator, JobRegistry, NoCredentials, RetentionConfig, RetentionManager,
    StrategyResolver,
};
use mediagrab_server::state::AppState;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/process", json!({
///         "url": "https://example.com/watch/1"
///     })).await;
///
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock extractor - script downloads and metadata
    pub extractor: MockExtractor,
    /// Mock transcoder - control audio derivation
    pub transcoder: MockTranscoder,
    /// Orchestrator shared with the router
    pub orchestrator: Arc<JobOrchestrator>,
    /// Temporary directory for job output
    pub temp_dir: TempDir,
    /// Output directory served by the download endpoint
    pub output_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_retention(RetentionConfig::default())
    }

    /// Create a test fixture with a custom retention policy.
    pub fn with_retention(retention: RetentionConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_dir = temp_dir.path().join("output");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output dir");

        let extractor = MockExtractor::new();
        let transcoder = MockTranscoder::new();

        let mut config = Config::default();
        config.storage.output_dir = output_dir.clone();
        config.storage.snapshot_path = temp_dir.path().join("jobs.json");
        config.retention = retention.clone();

        let orchestrator = Arc::new(JobOrchestrator::new(
            Arc::new(JobRegistry::in_memory()),
            Arc::new(StrategyResolver::new(
                &config.extractor,
                Arc::new(NoCredentials),
            )),
            Arc::new(extractor.clone()),
            Arc::new(transcoder.clone()),
            output_dir.clone(),
        ));
        let retention = RetentionManager::new(&output_dir, &retention);

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator), retention));
        let router = mediagrab_server::api::create_router(state);

        Self {
            router,
            extractor,
            transcoder,
            orchestrator,
            temp_dir,
            output_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request with one extra header.
    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header(name, value)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Poll a job until it reaches a terminal status.
    pub async fn wait_for_job(&self, task_id: &str) -> Value {
        let start = std::time::Instant::now();
        loop {
            let response = self.get(&format!("/api/status/{}", task_id)).await;
            let status = response.body["status"].as_str().unwrap_or_default().to_string();
            if status == "completed" || status == "failed" {
                return response.body;
            }
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "job {} stuck in {}",
                task_id,
                status
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw: body_bytes.to_vec(),
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
