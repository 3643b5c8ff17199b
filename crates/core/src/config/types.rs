use serde::{Deserialize, Serialize};

use crate::orchestrator::ProgressConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dashboard backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend URL (e.g., "http://127.0.0.1:7001")
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Timeout for the download start request, which the backend may hold
    /// open until every download has finished (default: 3600)
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,
    #[serde(default = "default_submit_path")]
    pub submit_path: String,
    #[serde(default = "default_progress_path")]
    pub progress_path: String,
    /// Saved reports are fetched from `{saved_reports_path}/{date}`
    #[serde(default = "default_saved_reports_path")]
    pub saved_reports_path: String,
    #[serde(default = "default_search_path")]
    pub search_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
            submit_timeout_secs: default_submit_timeout(),
            submit_path: default_submit_path(),
            progress_path: default_progress_path(),
            saved_reports_path: default_saved_reports_path(),
            search_path: default_search_path(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_submit_timeout() -> u64 {
    3600
}

fn default_submit_path() -> String {
    "/api/v1/reports/download/start".to_string()
}

fn default_progress_path() -> String {
    "/api/v1/downloads/progress".to_string()
}

fn default_saved_reports_path() -> String {
    "/api/v1/reports/saved".to_string()
}

fn default_search_path() -> String {
    "/api/v1/reports/search-with-duplicates".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
