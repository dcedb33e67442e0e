//! Acquisition engine implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::attempt::AttemptIds;
use super::error::AcquisitionError;
use super::types::{reconcile, AcquiredAssets, AttemptBranch, OutputSelection, Reconciliation};
use crate::extractor::{AssetKind, DownloadRequest, Extractor};
use crate::metrics;
use crate::platform::StrategyProfile;
use crate::transcoder::AudioTranscoder;

/// Receives progress milestones during an acquisition.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, progress: u8, message: &str);
}

/// Reporter that discards progress.
pub struct NoopReporter;

#[async_trait]
impl ProgressReporter for NoopReporter {
    async fn report(&self, _progress: u8, _message: &str) {}
}

/// Progress milestones reported by the engine.
const PROGRESS_PRIMARY_DONE: u8 = 50;
const PROGRESS_FALLBACK: u8 = 70;

/// Downloads the assets for a job, falling back as needed.
pub struct AcquisitionEngine {
    extractor: Arc<dyn Extractor>,
    transcoder: Arc<dyn AudioTranscoder>,
    output_dir: PathBuf,
}

impl AcquisitionEngine {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn AudioTranscoder>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            transcoder,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Acquires the selected assets for a URL.
    ///
    /// Returns at least one file on success. A `Both` selection may degrade to
    /// a single asset when fallbacks are exhausted for the other.
    pub async fn acquire(
        &self,
        url: &str,
        selection: OutputSelection,
        profile: &StrategyProfile,
        attempts: &AttemptIds,
        reporter: &dyn ProgressReporter,
    ) -> Result<AcquiredAssets, AcquisitionError> {
        info!(
            url = %url,
            platform = %profile.platform,
            ?selection,
            "Starting acquisition"
        );

        let assets = match selection {
            OutputSelection::Both => self.acquire_both(url, profile, attempts, reporter).await?,
            OutputSelection::VideoOnly => {
                self.acquire_video_only(url, profile, attempts, reporter)
                    .await?
            }
            OutputSelection::AudioOnly => {
                self.acquire_audio_only(url, profile, attempts, reporter)
                    .await?
            }
        };

        info!(url = %url, files = assets.len(), "Acquisition finished");
        Ok(assets)
    }

    async fn acquire_both(
        &self,
        url: &str,
        profile: &StrategyProfile,
        attempts: &AttemptIds,
        reporter: &dyn ProgressReporter,
    ) -> Result<AcquiredAssets, AcquisitionError> {
        let (video, audio) = tokio::join!(
            self.attempt(url, AssetKind::Video, profile, attempts, AttemptBranch::Primary),
            self.attempt(url, AssetKind::Audio, profile, attempts, AttemptBranch::Primary),
        );
        reporter
            .report(PROGRESS_PRIMARY_DONE, "Primary downloads finished")
            .await;

        let mut assets = AcquiredAssets::default();

        match reconcile(video, audio) {
            Reconciliation::Complete { video, audio } => {
                assets.insert(AssetKind::Video, video);
                assets.insert(AssetKind::Audio, audio);
            }
            Reconciliation::DeriveAudio { video, audio_error } => {
                warn!(error = %audio_error, "Audio download failed, transcoding from video");
                metrics::FALLBACK_ACTIONS
                    .with_label_values(&["derive_audio"])
                    .inc();
                reporter
                    .report(PROGRESS_FALLBACK, "Extracting audio from video")
                    .await;

                match self.derive_audio(&video, attempts).await {
                    Ok(audio) => assets.insert(AssetKind::Audio, audio),
                    Err(e) => warn!(error = %e, "Audio transcoding failed, returning video only"),
                }
                assets.insert(AssetKind::Video, video);
            }
            Reconciliation::RetryVideo { audio, video_error } => {
                warn!(error = %video_error, "Video download failed, retrying once");
                metrics::FALLBACK_ACTIONS
                    .with_label_values(&["retry_video"])
                    .inc();
                reporter.report(PROGRESS_FALLBACK, "Retrying video download").await;

                match self
                    .attempt(url, AssetKind::Video, profile, attempts, AttemptBranch::Retry)
                    .await
                {
                    Ok(video) => assets.insert(AssetKind::Video, video),
                    Err(e) => warn!(error = %e, "Video retry failed, returning audio only"),
                }
                assets.insert(AssetKind::Audio, audio);
            }
            Reconciliation::Emergency {
                video_error,
                audio_error,
            } => {
                warn!(
                    video_error = %video_error,
                    audio_error = %audio_error,
                    "Both downloads failed, trying emergency video download"
                );
                metrics::FALLBACK_ACTIONS
                    .with_label_values(&["emergency"])
                    .inc();
                reporter
                    .report(PROGRESS_FALLBACK, "Emergency video download")
                    .await;

                let video = self
                    .attempt(url, AssetKind::Video, profile, attempts, AttemptBranch::Emergency)
                    .await
                    .map_err(|emergency| AcquisitionError::Aggregate {
                        video: video_error.to_string(),
                        audio: audio_error.to_string(),
                        emergency: emergency.to_string(),
                    })?;

                match self.derive_audio(&video, attempts).await {
                    Ok(audio) => assets.insert(AssetKind::Audio, audio),
                    Err(e) => warn!(error = %e, "Audio transcoding failed, returning video only"),
                }
                assets.insert(AssetKind::Video, video);
            }
        }

        Ok(assets)
    }

    async fn acquire_video_only(
        &self,
        url: &str,
        profile: &StrategyProfile,
        attempts: &AttemptIds,
        reporter: &dyn ProgressReporter,
    ) -> Result<AcquiredAssets, AcquisitionError> {
        let primary = self
            .attempt(url, AssetKind::Video, profile, attempts, AttemptBranch::Primary)
            .await;
        reporter
            .report(PROGRESS_PRIMARY_DONE, "Video download finished")
            .await;

        let video = match primary {
            Ok(video) => video,
            Err(primary_error) => {
                warn!(error = %primary_error, "Video download failed, retrying once");
                metrics::FALLBACK_ACTIONS
                    .with_label_values(&["retry_video"])
                    .inc();
                reporter.report(PROGRESS_FALLBACK, "Retrying video download").await;

                self.attempt(url, AssetKind::Video, profile, attempts, AttemptBranch::Retry)
                    .await
                    .map_err(|retry_error| AcquisitionError::VideoUnavailable {
                        primary: primary_error.to_string(),
                        retry: retry_error.to_string(),
                    })?
            }
        };

        let mut assets = AcquiredAssets::default();
        assets.insert(AssetKind::Video, video);
        Ok(assets)
    }

    async fn acquire_audio_only(
        &self,
        url: &str,
        profile: &StrategyProfile,
        attempts: &AttemptIds,
        reporter: &dyn ProgressReporter,
    ) -> Result<AcquiredAssets, AcquisitionError> {
        let primary = self
            .attempt(url, AssetKind::Audio, profile, attempts, AttemptBranch::Primary)
            .await;
        reporter
            .report(PROGRESS_PRIMARY_DONE, "Audio download finished")
            .await;

        let audio = match primary {
            Ok(audio) => audio,
            Err(audio_error) => {
                warn!(error = %audio_error, "Audio download failed, falling back to video");
                metrics::FALLBACK_ACTIONS
                    .with_label_values(&["video_fallback"])
                    .inc();
                reporter
                    .report(PROGRESS_FALLBACK, "Downloading video to extract audio")
                    .await;

                let video = self
                    .attempt(url, AssetKind::Video, profile, attempts, AttemptBranch::Fallback)
                    .await
                    .map_err(|e| AcquisitionError::AudioUnavailable {
                        audio: audio_error.to_string(),
                        fallback: e.to_string(),
                    })?;

                let derived = self.derive_audio(&video, attempts).await;
                discard_intermediate(&video).await;

                derived.map_err(|e| AcquisitionError::AudioUnavailable {
                    audio: audio_error.to_string(),
                    fallback: e.to_string(),
                })?
            }
        };

        let mut assets = AcquiredAssets::default();
        assets.insert(AssetKind::Audio, audio);
        Ok(assets)
    }

    /// Runs one extractor download and confirms the file exists.
    async fn attempt(
        &self,
        url: &str,
        kind: AssetKind,
        profile: &StrategyProfile,
        attempts: &AttemptIds,
        branch: AttemptBranch,
    ) -> Result<PathBuf, AcquisitionError> {
        let stem = attempts.next(kind);
        let request = DownloadRequest::new(kind, &self.output_dir, stem.clone());
        debug!(%kind, %branch, attempt = %stem, "Starting download attempt");

        let result = match self.extractor.download(url, profile, &request).await {
            Ok(()) => request
                .locate_output()
                .ok_or_else(|| AcquisitionError::MissingOutput {
                    kind,
                    attempt: stem.clone(),
                }),
            Err(source) => Err(AcquisitionError::Extractor {
                kind,
                attempt: stem.clone(),
                source,
            }),
        };

        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::ACQUISITION_ATTEMPTS
            .with_label_values(&[kind.as_str(), branch.as_str(), outcome])
            .inc();

        match &result {
            Ok(path) => debug!(%kind, %branch, path = %path.display(), "Download attempt succeeded"),
            Err(e) => debug!(%kind, %branch, error = %e, "Download attempt failed"),
        }

        result
    }

    /// Transcodes an audio track from a local video into a fresh audio file.
    async fn derive_audio(
        &self,
        video: &Path,
        attempts: &AttemptIds,
    ) -> Result<PathBuf, AcquisitionError> {
        let stem = attempts.next(AssetKind::Audio);
        let output = self.output_dir.join(format!("{}.mp3", stem));

        let result = self.transcoder.extract_audio(video, &output).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::TRANSCODES.with_label_values(&[outcome]).inc();

        Ok(result?)
    }
}

/// Best-effort removal of an intermediate file.
async fn discard_intermediate(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove intermediate file");
    }
}
