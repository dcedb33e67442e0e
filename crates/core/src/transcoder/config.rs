//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the ffmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Audio encoder name.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Target bitrate in kbps.
    #[serde(default = "default_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// Target sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,

    /// Timeout for a single transcode in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_audio_codec() -> String {
    "libmp3lame".to_string()
}

fn default_bitrate() -> u32 {
    192
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_bitrate(),
            sample_rate_hz: default_sample_rate(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

impl TranscoderConfig {
    /// Sets the ffmpeg path.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
