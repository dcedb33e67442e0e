//! Types for the retention manager.

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Errors from a retention pass.
#[derive(Debug, Error)]
pub enum RetentionError {
    /// The directory could not be listed.
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking worker panicked or was cancelled.
    #[error("retention worker failed: {0}")]
    Worker(String),
}

/// A file considered by a retention pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

impl FileRecord {
    /// Age relative to `now`; files modified in the future have age zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.modified).unwrap_or(Duration::ZERO)
    }
}

/// Statistics of a completed pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupStats {
    pub total_files: usize,
    pub deleted_files: usize,
    pub failed_deletions: usize,
    pub preserved_files: usize,
    pub freed_bytes: u64,
    pub freed_space_mb: f64,
    pub remaining_bytes: u64,
    /// Human-readable notes on what each phase did.
    pub strategy: Vec<String>,
}

/// Result of a retention pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// The output directory does not exist.
    NoDirectory { message: String },
    /// The directory holds no eligible files.
    NoFiles { message: String },
    /// The pass ran.
    Completed(CleanupStats),
}

impl CleanupOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CleanupOutcome::NoDirectory { .. } => "no_directory",
            CleanupOutcome::NoFiles { .. } => "no_files",
            CleanupOutcome::Completed(_) => "completed",
        }
    }
}

/// Summary of the output directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageInfo {
    pub directory_exists: bool,
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub oldest_file_hours: Option<f64>,
    pub newest_file_hours: Option<f64>,
    pub output_dir: PathBuf,
}

/// Bytes to megabytes, rounded to two decimals.
pub(crate) fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Duration to hours, rounded to two decimals.
pub(crate) fn to_hours(age: Duration) -> f64 {
    (age.as_secs_f64() / 3600.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let outcome = CleanupOutcome::NoDirectory {
            message: "missing".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "no_directory");

        let outcome = CleanupOutcome::Completed(CleanupStats {
            total_files: 3,
            deleted_files: 1,
            ..Default::default()
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["deleted_files"], 1);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(to_mb(1024 * 1024), 1.0);
        assert_eq!(to_mb(1536 * 1024), 1.5);
        assert_eq!(to_hours(Duration::from_secs(5400)), 1.5);
    }

    #[test]
    fn test_future_mtime_has_zero_age() {
        let now = SystemTime::now();
        let record = FileRecord {
            path: PathBuf::from("x"),
            size_bytes: 1,
            modified: now + Duration::from_secs(60),
        };
        assert_eq!(record.age(now), Duration::ZERO);
    }
}
