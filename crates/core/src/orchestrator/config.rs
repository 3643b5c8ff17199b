//! Progress and orchestration configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for progress polling and batch finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// How often the poller asks the backend for progress (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Capacity of the feed channel between poller and orchestrator.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// How long the completion notice stays visible (milliseconds).
    #[serde(default = "default_completion_notice")]
    pub completion_notice_ms: u64,
}

fn default_poll_interval() -> u64 {
    1000 // 1 second
}

fn default_channel_capacity() -> usize {
    64
}

fn default_completion_notice() -> u64 {
    3000 // 3 seconds
}

impl ProgressConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn completion_notice(&self) -> Duration {
        Duration::from_millis(self.completion_notice_ms)
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            channel_capacity: default_channel_capacity(),
            completion_notice_ms: default_completion_notice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(config.completion_notice(), Duration::from_secs(3));
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            poll_interval_ms = 250
        "#;
        let config: ProgressConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.completion_notice_ms, 3000);
    }
}
