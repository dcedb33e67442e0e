//! yt-dlp based extractor implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::traits::Extractor;
use super::types::{AssetKind, DownloadRequest, MediaMetadata};
use crate::platform::StrategyProfile;

const MERGE_OUTPUT_FORMAT: &str = "mp4";
const AUDIO_FORMAT: &str = "mp3";
const AUDIO_QUALITY: &str = "192K";

static BOT_CHECK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)sign in to confirm|\bbot\b").unwrap());

static ERROR_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ERROR:\s*(.+)$").unwrap());

/// Extractor that runs the yt-dlp command line tool.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Creates an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Arguments shared by every invocation, derived from the strategy profile.
    fn build_common_args(&self, profile: &StrategyProfile) -> Vec<String> {
        let retry = &profile.retry;
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--socket-timeout".to_string(),
            profile.socket_timeout_secs.to_string(),
            "--retries".to_string(),
            retry.retries.to_string(),
            "--fragment-retries".to_string(),
            retry.fragment_retries.to_string(),
            "--extractor-retries".to_string(),
            retry.retries.to_string(),
            "--file-access-retries".to_string(),
            retry.retries.to_string(),
            "--sleep-requests".to_string(),
            retry.sleep_interval_secs.to_string(),
            "--sleep-interval".to_string(),
            retry.sleep_interval_secs.to_string(),
            "--max-sleep-interval".to_string(),
            retry.max_sleep_interval_secs.to_string(),
        ];

        for (name, value) in &profile.headers {
            args.extend(["--add-header".to_string(), format!("{}:{}", name, value)]);
        }

        for extractor_arg in &profile.extractor_args {
            args.extend(["--extractor-args".to_string(), extractor_arg.clone()]);
        }

        if let Some(proxy) = &profile.proxy_url {
            args.extend(["--proxy".to_string(), proxy.clone()]);
        }

        if let Some(credentials) = &profile.credentials {
            args.extend([
                "--cookies".to_string(),
                credentials.cookies_file.to_string_lossy().to_string(),
            ]);
        }

        args
    }

    /// Builds arguments for a metadata-only call.
    fn build_info_args(&self, url: &str, profile: &StrategyProfile) -> Vec<String> {
        let mut args = self.build_common_args(profile);
        args.extend(["--dump-json".to_string(), "--skip-download".to_string()]);
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    /// Builds arguments for an asset download.
    fn build_download_args(
        &self,
        url: &str,
        profile: &StrategyProfile,
        request: &DownloadRequest,
    ) -> Vec<String> {
        let mut args = self.build_common_args(profile);

        match request.kind {
            AssetKind::Video => {
                args.extend([
                    "-f".to_string(),
                    profile.video_format.selector(),
                    "--merge-output-format".to_string(),
                    MERGE_OUTPUT_FORMAT.to_string(),
                ]);
            }
            AssetKind::Audio => {
                args.extend([
                    "-f".to_string(),
                    profile.audio_format.selector(),
                    "-x".to_string(),
                    "--audio-format".to_string(),
                    AUDIO_FORMAT.to_string(),
                    "--audio-quality".to_string(),
                    AUDIO_QUALITY.to_string(),
                ]);
            }
        }

        args.extend([
            "-o".to_string(),
            request.output_template().to_string_lossy().to_string(),
            "--".to_string(),
            url.to_string(),
        ]);
        args
    }

    /// Runs yt-dlp and returns stdout on success.
    async fn run(&self, args: &[String]) -> Result<String, ExtractorError> {
        debug!(binary = %self.config.ytdlp_path.display(), ?args, "Running extractor");

        let child = Command::new(&self.config.ytdlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::NotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    ExtractorError::Io(e)
                }
            })?;

        let timeout_duration = Duration::from_secs(self.config.process_timeout_secs);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(output) => output?,
            // Dropping the child on timeout kills the process.
            Err(_) => {
                return Err(ExtractorError::Timeout {
                    timeout_secs: self.config.process_timeout_secs,
                })
            }
        };

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        Err(Self::classify_failure(output.status.code(), &stderr))
    }

    /// Maps a failed run to an error, recognizing bot-detection responses.
    fn classify_failure(code: Option<i32>, stderr: &str) -> ExtractorError {
        let reason = Self::error_message(stderr)
            .unwrap_or_else(|| format!("yt-dlp exited with code: {:?}", code));

        if BOT_CHECK_RE.is_match(stderr) {
            return ExtractorError::BotDetected { reason };
        }

        let stderr = stderr.trim();
        ExtractorError::failed(
            reason,
            if stderr.is_empty() {
                None
            } else {
                Some(stderr.to_string())
            },
        )
    }

    /// Extracts the last `ERROR:` line from yt-dlp stderr.
    fn error_message(stderr: &str) -> Option<String> {
        stderr
            .lines()
            .filter_map(|line| ERROR_LINE_RE.captures(line.trim()))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
            .last()
    }

    /// Parses `--dump-json` output into metadata.
    fn parse_info_output(output: &str) -> Result<MediaMetadata, ExtractorError> {
        #[derive(Deserialize)]
        struct InfoOutput {
            title: Option<String>,
            duration: Option<f64>,
            uploader: Option<String>,
            view_count: Option<u64>,
            like_count: Option<u64>,
            description: Option<String>,
            upload_date: Option<String>,
            thumbnail: Option<String>,
            webpage_url: Option<String>,
            extractor: Option<String>,
            id: Option<String>,
            #[serde(default)]
            formats: Vec<serde_json::Value>,
        }

        // yt-dlp prints one JSON document per line; the first describes the URL.
        let line = output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| ExtractorError::ParseError {
                reason: "yt-dlp produced no metadata".to_string(),
            })?;

        let info: InfoOutput =
            serde_json::from_str(line).map_err(|e| ExtractorError::ParseError {
                reason: format!("Failed to parse yt-dlp metadata: {}", e),
            })?;

        Ok(MediaMetadata {
            title: info.title.unwrap_or_else(|| "Unknown".to_string()),
            duration_secs: info.duration,
            uploader: info.uploader,
            view_count: info.view_count,
            like_count: info.like_count,
            description: info.description,
            upload_date: info.upload_date,
            thumbnail: info.thumbnail,
            webpage_url: info.webpage_url,
            extractor: info.extractor,
            media_id: info.id,
            format_count: info.formats.len(),
        })
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch_info(
        &self,
        url: &str,
        profile: &StrategyProfile,
    ) -> Result<MediaMetadata, ExtractorError> {
        let args = self.build_info_args(url, profile);
        let stdout = self.run(&args).await?;
        Self::parse_info_output(&stdout)
    }

    async fn download(
        &self,
        url: &str,
        profile: &StrategyProfile,
        request: &DownloadRequest,
    ) -> Result<(), ExtractorError> {
        tokio::fs::create_dir_all(&request.output_dir).await?;
        let args = self.build_download_args(url, profile, request);
        self.run(&args).await.map(|_| ())
    }
}
