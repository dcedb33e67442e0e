//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the external extractor and transcoder tools and
//! write real (tiny) files, so the acquisition engine's file-presence checks
//! behave exactly as in production.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediagrab_core::testing::{MockBehavior, MockExtractor, MockTranscoder};
//! use mediagrab_core::AssetKind;
//!
//! let extractor = MockExtractor::new();
//! extractor
//!     .push_behavior(AssetKind::Audio, MockBehavior::Fail("HTTP Error 403".into()))
//!     .await;
//!
//! let transcoder = MockTranscoder::new();
//! // Use in an AcquisitionEngine or JobOrchestrator...
//! ```

mod mock_extractor;
mod mock_transcoder;
mod static_credentials;

pub use mock_extractor::{MockBehavior, MockExtractor, RecordedDownload};
pub use mock_transcoder::MockTranscoder;
pub use static_credentials::StaticCredentialStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::extractor::MediaMetadata;

    /// Metadata for a typical short clip.
    pub fn sample_metadata(title: &str) -> MediaMetadata {
        MediaMetadata {
            title: title.to_string(),
            duration_secs: Some(213.0),
            uploader: Some("Test Uploader".to_string()),
            view_count: Some(1_000),
            like_count: Some(100),
            description: Some("A test clip".to_string()),
            upload_date: Some("20240101".to_string()),
            thumbnail: None,
            webpage_url: Some("https://example.com/watch/1".to_string()),
            extractor: Some("generic".to_string()),
            media_id: Some("clip1".to_string()),
            format_count: 4,
        }
    }
}
