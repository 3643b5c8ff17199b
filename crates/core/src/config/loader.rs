use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `POOLSCOUT_BACKEND_BASE_URL`.
///
/// The first underscore after the prefix separates the section from the key,
/// so `POOLSCOUT_PROGRESS_POLL_INTERVAL_MS` sets `progress.poll_interval_ms`.
pub const ENV_PREFIX: &str = "POOLSCOUT_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config"])
                .map(|key| key.as_str().replacen('_', ".", 1).into()),
        )
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[backend]
base_url = "http://127.0.0.1:7001"

[progress]
poll_interval_ms = 500
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:7001");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.backend.submit_timeout_secs, 3600);
        assert_eq!(config.backend.submit_path, "/api/v1/reports/download/start");
        assert_eq!(config.progress.poll_interval_ms, 500);
        assert_eq!(config.progress.completion_notice_ms, 3000);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_load_config_from_str_missing_backend() {
        let toml = r#"
[logging]
filter = "debug"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/poolscout.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[backend]
base_url = "http://10.0.0.5:7001"
timeout_secs = 5

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5:7001");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_overrides_nested_key() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[backend]\nbase_url = \"http://127.0.0.1:7001\"").unwrap();

        // No other test reads progress.channel_capacity.
        std::env::set_var("POOLSCOUT_PROGRESS_CHANNEL_CAPACITY", "7");
        let config = load_config(temp_file.path());
        std::env::remove_var("POOLSCOUT_PROGRESS_CHANNEL_CAPACITY");

        let config = config.unwrap();
        assert_eq!(config.progress.channel_capacity, 7);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:7001");
    }
}
