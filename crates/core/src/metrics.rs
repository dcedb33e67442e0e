//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (submissions, terminal outcomes, duration)
//! - Acquisition (attempts per branch, fallback actions)
//! - Retention (passes, deleted files, freed bytes)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Job submissions by result.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediagrab_jobs_submitted_total", "Total job submissions"),
        &["result"], // "created", "deduplicated", "rejected"
    )
    .unwrap()
});

/// Jobs reaching a terminal state.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediagrab_jobs_finished_total", "Jobs reaching a terminal state"),
        &["status"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// Job duration in seconds, from start of run to terminal state.
pub static JOB_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("mediagrab_job_duration_seconds", "Duration of job runs")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
    )
    .unwrap()
});

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Individual extractor download attempts.
pub static ACQUISITION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediagrab_acquisition_attempts_total",
            "Extractor download attempts",
        ),
        &["kind", "branch", "result"], // result: "success", "failure"
    )
    .unwrap()
});

/// Cascade actions taken after a primary attempt failed.
pub static FALLBACK_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediagrab_fallback_actions_total",
            "Fallback actions taken by the acquisition cascade",
        ),
        &["action"], // "derive_audio", "retry_video", "emergency", "video_fallback"
    )
    .unwrap()
});

/// Local audio transcodes by result.
pub static TRANSCODES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediagrab_transcodes_total", "Audio transcodes from video"),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Retention Metrics
// =============================================================================

/// Retention passes by outcome.
pub static RETENTION_PASSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediagrab_retention_passes_total", "Retention passes run"),
        &["outcome"], // "completed", "no_files", "no_directory", "error"
    )
    .unwrap()
});

/// Files deleted by retention.
pub static RETENTION_DELETED_FILES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediagrab_retention_deleted_files_total",
        "Files deleted by retention passes",
    )
    .unwrap()
});

/// Bytes freed by retention.
pub static RETENTION_FREED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediagrab_retention_freed_bytes_total",
        "Bytes freed by retention passes",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Acquisition
        Box::new(ACQUISITION_ATTEMPTS.clone()),
        Box::new(FALLBACK_ACTIONS.clone()),
        Box::new(TRANSCODES.clone()),
        // Retention
        Box::new(RETENTION_PASSES.clone()),
        Box::new(RETENTION_DELETED_FILES.clone()),
        Box::new(RETENTION_FREED_BYTES.clone()),
    ]
}
