use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Request sleep bounds are ordered
/// - Retention check interval and retry delay are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let extractor = &config.extractor;
    if extractor.max_request_sleep_interval_secs < extractor.request_sleep_interval_secs {
        return Err(ConfigError::ValidationError(format!(
            "extractor.max_request_sleep_interval_secs ({}) is below request_sleep_interval_secs ({})",
            extractor.max_request_sleep_interval_secs, extractor.request_sleep_interval_secs
        )));
    }

    if config.retention.check_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "retention.check_interval_secs cannot be 0".to_string(),
        ));
    }

    if config.retention.retry_delay_secs == 0 {
        return Err(ConfigError::ValidationError(
            "retention.retry_delay_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
