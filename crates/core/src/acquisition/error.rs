//! Error types for the acquisition module.

use thiserror::Error;

use crate::extractor::{AssetKind, ExtractorError};
use crate::transcoder::TranscoderError;

/// Errors from acquiring a job's assets.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The extractor call itself failed.
    #[error("{kind} download failed ({attempt}): {source}")]
    Extractor {
        kind: AssetKind,
        attempt: String,
        #[source]
        source: ExtractorError,
    },

    /// The extractor reported success but no file was found.
    #[error("{kind} download for {attempt} reported success but produced no file")]
    MissingOutput { kind: AssetKind, attempt: String },

    /// Local audio transcoding failed.
    #[error("audio transcoding failed: {0}")]
    Transcode(#[from] TranscoderError),

    /// Video-only acquisition failed twice.
    #[error("video unavailable: first attempt: {primary}; retry: {retry}")]
    VideoUnavailable { primary: String, retry: String },

    /// Audio-only acquisition failed both directly and through the video fallback.
    #[error("audio unavailable: direct download: {audio}; video fallback: {fallback}")]
    AudioUnavailable { audio: String, fallback: String },

    /// Every branch of a video+audio acquisition failed.
    #[error("all download attempts failed: video: {video}; audio: {audio}; emergency video: {emergency}")]
    Aggregate {
        video: String,
        audio: String,
        emergency: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_mentions_every_failure() {
        let err = AcquisitionError::Aggregate {
            video: "video 403".to_string(),
            audio: "audio 403".to_string(),
            emergency: "still 403".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("video 403"));
        assert!(message.contains("audio 403"));
        assert!(message.contains("still 403"));
    }

    #[test]
    fn test_extractor_error_display() {
        let err = AcquisitionError::Extractor {
            kind: AssetKind::Audio,
            attempt: "audio_abc_01".to_string(),
            source: ExtractorError::failed("HTTP Error 403", None),
        };
        assert_eq!(
            err.to_string(),
            "audio download failed (audio_abc_01): Extraction failed: HTTP Error 403"
        );
    }
}
