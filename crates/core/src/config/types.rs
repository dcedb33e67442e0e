use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::extractor::ExtractorConfig;
use crate::retention::RetentionConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8001
}

/// Where downloaded files and the job snapshot live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Shared output directory for every job's files (also scanned by retention).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// JSON snapshot of the job registry, rewritten on every mutation.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/jobs.json")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub extractor: SanitizedExtractorConfig,
    pub transcoder: TranscoderConfig,
    pub retention: RetentionConfig,
}

/// Extractor settings with the proxy endpoint hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedExtractorConfig {
    pub ytdlp_path: PathBuf,
    pub proxy_configured: bool,
    pub request_sleep_interval_secs: u64,
    pub max_request_sleep_interval_secs: u64,
    pub max_retries: u32,
    pub socket_timeout_secs: u64,
    pub cookies_dir: PathBuf,
    pub process_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let extractor = &config.extractor;
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            extractor: SanitizedExtractorConfig {
                ytdlp_path: extractor.ytdlp_path.clone(),
                proxy_configured: extractor.proxy().is_some(),
                request_sleep_interval_secs: extractor.request_sleep_interval_secs,
                max_request_sleep_interval_secs: extractor.max_request_sleep_interval_secs,
                max_retries: extractor.max_retries,
                socket_timeout_secs: extractor.socket_timeout_secs,
                cookies_dir: extractor.cookies_dir.clone(),
                process_timeout_secs: extractor.process_timeout_secs,
            },
            transcoder: config.transcoder.clone(),
            retention: config.retention.clone(),
        }
    }
}
