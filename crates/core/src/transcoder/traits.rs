//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::TranscoderError;

/// Extracts an audio track from a video file.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Writes the audio track of `video` to `output`, returning the output path.
    async fn extract_audio(&self, video: &Path, output: &Path)
        -> Result<PathBuf, TranscoderError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscoderError>;
}
