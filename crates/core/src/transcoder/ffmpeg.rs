//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::TranscoderConfig;
use super::error::TranscoderError;
use super::traits::AudioTranscoder;

/// FFmpeg-based audio transcoder.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds ffmpeg arguments for audio extraction.
    fn build_args(&self, video: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-vn".to_string(), // Drop video streams
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
            "-ar".to_string(),
            self.config.sample_rate_hz.to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn map_spawn_error(&self, e: std::io::Error) -> TranscoderError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscoderError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            TranscoderError::Io(e)
        }
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn extract_audio(
        &self,
        video: &Path,
        output: &Path,
    ) -> Result<PathBuf, TranscoderError> {
        if !video.exists() {
            return Err(TranscoderError::InputNotFound {
                path: video.to_path_buf(),
            });
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(video, output);
        debug!(?args, "Running ffmpeg audio extraction");

        let child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.map_spawn_error(e))?;

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TranscoderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(TranscoderError::failed(
                format!("FFmpeg exited with code: {:?}", result.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        // Verify output exists
        if tokio::fs::metadata(output).await.is_err() {
            return Err(TranscoderError::failed("Output file not created", None));
        }

        Ok(output.to_path_buf())
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;

        if !result.status.success() {
            return Err(TranscoderError::failed("ffmpeg -version failed", None));
        }

        Ok(())
    }
}
