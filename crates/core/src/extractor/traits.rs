//! Trait definitions for the extractor module.

use async_trait::async_trait;

use super::error::ExtractorError;
use super::types::{DownloadRequest, MediaMetadata};
use crate::platform::StrategyProfile;

/// An external capability that resolves and downloads media from a URL.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Fetches metadata for the URL without downloading any media.
    async fn fetch_info(
        &self,
        url: &str,
        profile: &StrategyProfile,
    ) -> Result<MediaMetadata, ExtractorError>;

    /// Downloads one asset, writing it to the request's output template.
    ///
    /// A successful return does not guarantee a file was written; callers
    /// check [`DownloadRequest::locate_output`].
    async fn download(
        &self,
        url: &str,
        profile: &StrategyProfile,
        request: &DownloadRequest,
    ) -> Result<(), ExtractorError>;
}
