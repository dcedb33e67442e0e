//! Configuration for the retention manager.

use serde::{Deserialize, Serialize};

/// Retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Whether the periodic cleanup loop runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between passes.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Files older than this many hours are deleted.
    #[serde(default = "default_retention_hours")]
    pub file_retention_hours: u64,

    /// Storage budget for the output directory, in megabytes.
    #[serde(default = "default_max_storage")]
    pub max_storage_mb: u64,

    /// Number of most recent files never deleted.
    #[serde(default = "default_preserve_recent")]
    pub preserve_recent_files: usize,

    /// Run a pass immediately when the loop starts.
    #[serde(default = "default_enabled")]
    pub cleanup_on_startup: bool,

    /// Seconds to wait after a failed pass.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_check_interval() -> u64 {
    3600 // 1 hour
}

fn default_retention_hours() -> u64 {
    24
}

fn default_max_storage() -> u64 {
    1000
}

fn default_preserve_recent() -> usize {
    10
}

fn default_retry_delay() -> u64 {
    60
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            check_interval_secs: default_check_interval(),
            file_retention_hours: default_retention_hours(),
            max_storage_mb: default_max_storage(),
            preserve_recent_files: default_preserve_recent(),
            cleanup_on_startup: default_enabled(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetentionConfig::default();
        assert!(config.enabled);
        assert_eq!(config.check_interval_secs, 3600);
        assert_eq!(config.file_retention_hours, 24);
        assert_eq!(config.max_storage_mb, 1000);
        assert_eq!(config.preserve_recent_files, 10);
        assert!(config.cleanup_on_startup);
        assert_eq!(config.retry_delay_secs, 60);
    }

    #[test]
    fn test_partial_toml() {
        let config: RetentionConfig = toml::from_str(
            r#"
            file_retention_hours = 6
            cleanup_on_startup = false
            "#,
        )
        .unwrap();
        assert_eq!(config.file_retention_hours, 6);
        assert!(!config.cleanup_on_startup);
        assert_eq!(config.max_storage_mb, 1000);
    }
}
