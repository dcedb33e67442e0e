//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while transcoding.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Transcoding process failed.
    #[error("Transcoding failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Transcoding timed out.
    #[error("Transcoding timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during transcoding.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscoderError {
    /// Creates a new failed error with stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranscoderError::InputNotFound {
            path: PathBuf::from("/tmp/video.mp4"),
        };
        assert_eq!(err.to_string(), "Input file not found: /tmp/video.mp4");

        let err = TranscoderError::failed("exit code 1", Some("boom".to_string()));
        assert_eq!(err.to_string(), "Transcoding failed: exit code 1");
    }
}
