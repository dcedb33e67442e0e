//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::extractor::{AssetKind, DownloadRequest, Extractor, ExtractorError, MediaMetadata};
use crate::platform::StrategyProfile;

use super::fixtures::sample_metadata;

/// How a scripted download call behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Write the output file and report success.
    Succeed,
    /// Report success without writing any file.
    SucceedWithoutFile,
    /// Report failure with the given message.
    Fail(String),
}

/// A recorded download call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDownload {
    pub url: String,
    pub kind: AssetKind,
    pub stem: String,
    pub profile: StrategyProfile,
}

/// Mock implementation of the Extractor trait.
///
/// Provides controllable behavior for testing:
/// - Per-kind queues of scripted behaviors, falling back to a default
/// - Configurable metadata or metadata failure
/// - Optional artificial latency
/// - Recorded calls for assertions
#[derive(Debug, Clone)]
pub struct MockExtractor {
    scripts: Arc<RwLock<HashMap<AssetKind, VecDeque<MockBehavior>>>>,
    defaults: Arc<RwLock<HashMap<AssetKind, MockBehavior>>>,
    info: Arc<RwLock<Result<MediaMetadata, String>>>,
    delay: Arc<RwLock<Duration>>,
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
    info_calls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Create a new mock extractor where every call succeeds.
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(HashMap::new())),
            defaults: Arc::new(RwLock::new(HashMap::new())),
            info: Arc::new(RwLock::new(Ok(sample_metadata("Test Clip")))),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            downloads: Arc::new(RwLock::new(Vec::new())),
            info_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a behavior for the next download of a kind.
    pub async fn push_behavior(&self, kind: AssetKind, behavior: MockBehavior) {
        self.scripts
            .write()
            .await
            .entry(kind)
            .or_default()
            .push_back(behavior);
    }

    /// Set the behavior used once the queue for a kind is empty.
    pub async fn set_default_behavior(&self, kind: AssetKind, behavior: MockBehavior) {
        self.defaults.write().await.insert(kind, behavior);
    }

    /// Set the metadata returned by `fetch_info`.
    pub async fn set_info(&self, info: MediaMetadata) {
        *self.info.write().await = Ok(info);
    }

    /// Make `fetch_info` fail with the given message.
    pub async fn set_info_error(&self, message: impl Into<String>) {
        *self.info.write().await = Err(message.into());
    }

    /// Delay every call by the given duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded download calls.
    pub async fn downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }

    /// Get the URLs passed to `fetch_info`.
    pub async fn info_calls(&self) -> Vec<String> {
        self.info_calls.read().await.clone()
    }

    async fn next_behavior(&self, kind: AssetKind) -> MockBehavior {
        if let Some(behavior) = self
            .scripts
            .write()
            .await
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
        {
            return behavior;
        }

        self.defaults
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or(MockBehavior::Succeed)
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_info(
        &self,
        url: &str,
        _profile: &StrategyProfile,
    ) -> Result<MediaMetadata, ExtractorError> {
        self.info_calls.write().await.push(url.to_string());
        self.simulate_latency().await;

        self.info
            .read()
            .await
            .clone()
            .map_err(|message| ExtractorError::failed(message, None))
    }

    async fn download(
        &self,
        url: &str,
        profile: &StrategyProfile,
        request: &DownloadRequest,
    ) -> Result<(), ExtractorError> {
        self.downloads.write().await.push(RecordedDownload {
            url: url.to_string(),
            kind: request.kind,
            stem: request.stem.clone(),
            profile: profile.clone(),
        });
        self.simulate_latency().await;

        match self.next_behavior(request.kind).await {
            MockBehavior::Succeed => {
                let ext = request.kind.extensions()[0];
                tokio::fs::create_dir_all(&request.output_dir).await?;
                tokio::fs::write(
                    request.path_with_extension(ext),
                    format!("mock {} from {}", request.kind, url),
                )
                .await?;
                Ok(())
            }
            MockBehavior::SucceedWithoutFile => Ok(()),
            MockBehavior::Fail(message) => Err(ExtractorError::failed(message, None)),
        }
    }
}
