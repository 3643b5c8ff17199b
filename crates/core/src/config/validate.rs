use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Backend URL is non-empty and http(s)
/// - Timeout, poll interval and channel capacity are not 0
/// - The submission timeout is at least the request timeout
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Backend validation
    let url = config.backend.base_url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "backend.base_url cannot be empty".to_string(),
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "backend.base_url must start with http:// or https://, got '{}'",
            url
        )));
    }
    if config.backend.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "backend.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.backend.submit_timeout_secs < config.backend.timeout_secs {
        return Err(ConfigError::ValidationError(format!(
            "backend.submit_timeout_secs ({}) cannot be shorter than backend.timeout_secs ({})",
            config.backend.submit_timeout_secs, config.backend.timeout_secs
        )));
    }

    // Progress validation
    if config.progress.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "progress.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.progress.channel_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "progress.channel_capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}
