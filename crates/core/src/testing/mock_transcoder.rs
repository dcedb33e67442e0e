//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transcoder::{AudioTranscoder, TranscoderError};

/// Mock implementation of the AudioTranscoder trait.
///
/// Writes a small output file on success and records every call as an
/// `(input, output)` pair.
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    calls: Arc<RwLock<Vec<(PathBuf, PathBuf)>>>,
    failure: Arc<RwLock<Option<String>>>,
    consume_input: Arc<RwLock<bool>>,
}

impl MockTranscoder {
    /// Create a new mock transcoder where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with the given message, or succeed with `None`.
    pub async fn set_failure(&self, message: Option<String>) {
        *self.failure.write().await = message;
    }

    /// Delete the input video after a successful call, as a tool that
    /// cleans up after itself would.
    pub async fn set_consume_input(&self, consume: bool) {
        *self.consume_input.write().await = consume;
    }

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl AudioTranscoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract_audio(
        &self,
        video: &Path,
        output: &Path,
    ) -> Result<PathBuf, TranscoderError> {
        self.calls
            .write()
            .await
            .push((video.to_path_buf(), output.to_path_buf()));

        if let Some(message) = self.failure.read().await.clone() {
            return Err(TranscoderError::failed(message, None));
        }

        if !video.exists() {
            return Err(TranscoderError::InputNotFound {
                path: video.to_path_buf(),
            });
        }

        tokio::fs::write(output, b"mock audio").await?;
        if *self.consume_input.read().await {
            tokio::fs::remove_file(video).await?;
        }
        Ok(output.to_path_buf())
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        Ok(())
    }
}
