//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the mediagrab server:
//! - HTTP request metrics (latency, counts)
//! - Job gauges (collected dynamically)
//! - Core job, acquisition and retention counters

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediagrab_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediagrab_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediagrab_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Job tasks currently executing.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediagrab_jobs_active", "Number of job tasks currently running").unwrap()
});

/// URLs with a non-terminal job.
pub static IN_FLIGHT_URLS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediagrab_in_flight_urls",
        "Number of URLs with a queued or running job",
    )
    .unwrap()
});

/// Jobs held by the registry.
pub static JOBS_TRACKED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediagrab_jobs_tracked", "Number of jobs held by the registry").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Jobs
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();
    registry.register(Box::new(IN_FLIGHT_URLS.clone())).unwrap();
    registry.register(Box::new(JOBS_TRACKED.clone())).unwrap();

    // Core metrics (jobs, acquisition, retention)
    for metric in mediagrab_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let listing = state.orchestrator().list();
    JOBS_ACTIVE.set(listing.active_jobs as i64);
    IN_FLIGHT_URLS.set(listing.in_flight_urls as i64);
    JOBS_TRACKED.set(listing.total_jobs as i64);
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static DOWNLOAD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/api/download/.+$").unwrap());

/// Normalize a path for metric labels (replace IDs and file names with placeholders).
pub fn normalize_path(path: &str) -> String {
    if DOWNLOAD_RE.is_match(path) {
        return "/api/download/{file}".to_string();
    }
    UUID_RE.replace_all(path, "{id}").into_owned()
}
