use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for nested overrides, e.g. `MEDIAGRAB_SERVER__PORT=9000`.
const ENV_PREFIX: &str = "MEDIAGRAB_";

/// Flat environment keys understood for compatibility with existing deployments.
const FLAT_ENV_KEYS: &[(&str, &str)] = &[
    ("VIDEO_PROXY_URL", "extractor.proxy_url"),
    ("REQUEST_SLEEP_INTERVAL", "extractor.request_sleep_interval_secs"),
    (
        "MAX_REQUEST_SLEEP_INTERVAL",
        "extractor.max_request_sleep_interval_secs",
    ),
    ("MAX_RETRIES", "extractor.max_retries"),
    ("SOCKET_TIMEOUT", "extractor.socket_timeout_secs"),
    ("CLEANUP_ENABLED", "retention.enabled"),
    ("CLEANUP_CHECK_INTERVAL", "retention.check_interval_secs"),
    ("FILE_RETENTION_HOURS", "retention.file_retention_hours"),
    ("MAX_STORAGE_MB", "retention.max_storage_mb"),
    ("PRESERVE_RECENT_FILES", "retention.preserve_recent_files"),
    ("CLEANUP_ON_STARTUP", "retention.cleanup_on_startup"),
];

fn flat_env() -> Env {
    Env::raw().filter_map(|key| {
        FLAT_ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
    })
}

fn nested_env() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(flat_env())
        .merge(nested_env())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from defaults plus environment variables only.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(flat_env())
        .merge(nested_env())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
