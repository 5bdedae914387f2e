//! Job runner configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the job runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Enable/disable the background processing loop.
    /// When disabled, jobs must be processed via the API.
    #[serde(default)]
    pub enabled: bool,

    /// How often to poll for pending jobs (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum jobs processed concurrently. Within a single job,
    /// download and upload remain strictly sequential.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: usize,
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_max_concurrent() -> usize {
    2
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: default_poll_interval(),
            max_concurrent_jobs: default_max_concurrent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.max_concurrent_jobs, 2);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            enabled = true
        "#;
        let config: RunnerConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.poll_interval_ms, 2000);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            enabled = true
            poll_interval_ms = 500
            max_concurrent_jobs = 4
        "#;
        let config: RunnerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.max_concurrent_jobs, 4);
    }
}
