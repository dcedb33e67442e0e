//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during an extractor call.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    NotFound { path: PathBuf },

    /// The extractor exited unsuccessfully.
    #[error("Extraction failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// The platform refused the request as automated traffic.
    #[error(
        "The platform flagged the request as automated traffic. \
         Wait a few minutes and retry, check the server network, or configure a proxy. \
         Original error: {reason}"
    )]
    BotDetected { reason: String },

    /// The extractor process exceeded its time limit.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Metadata output could not be parsed.
    #[error("Failed to parse extractor output: {reason}")]
    ParseError { reason: String },

    /// I/O error while running the extractor.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Creates a new failed error with optional stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether this error is worth retrying with a fresh attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}
