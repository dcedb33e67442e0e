//! Configuration for the extractor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Base extractor settings. Platform strategies are layered on top of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Optional proxy endpoint passed to every extractor call.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Minimum sleep between requests, in seconds.
    #[serde(default = "default_sleep_interval")]
    pub request_sleep_interval_secs: u64,

    /// Upper bound of the randomized sleep between requests, in seconds.
    #[serde(default = "default_max_sleep_interval")]
    pub max_request_sleep_interval_secs: u64,

    /// Retry count for requests, fragments and file access.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Socket timeout in seconds.
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_secs: u64,

    /// Directory holding per-platform cookie files.
    #[serde(default = "default_cookies_dir")]
    pub cookies_dir: PathBuf,

    /// Hard limit for a single extractor process, in seconds.
    #[serde(default = "default_process_timeout")]
    pub process_timeout_secs: u64,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_sleep_interval() -> u64 {
    1
}

fn default_max_sleep_interval() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_socket_timeout() -> u64 {
    60
}

fn default_cookies_dir() -> PathBuf {
    PathBuf::from("cookies")
}

fn default_process_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            proxy_url: None,
            request_sleep_interval_secs: default_sleep_interval(),
            max_request_sleep_interval_secs: default_max_sleep_interval(),
            max_retries: default_max_retries(),
            socket_timeout_secs: default_socket_timeout(),
            cookies_dir: default_cookies_dir(),
            process_timeout_secs: default_process_timeout(),
        }
    }
}

impl ExtractorConfig {
    /// Proxy endpoint, ignoring blank values.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
