use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::extractor::ExtractorConfig;
use crate::orchestrator::RunnerConfig;
use crate::uploader::{GraphConfig, UploadConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    pub graph: GraphConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
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
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("crosspost.db")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub extractor: ExtractorConfig,
    pub graph: SanitizedGraphConfig,
    pub upload: UploadConfig,
    pub runner: RunnerConfig,
}

/// Sanitized Graph API config (access token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGraphConfig {
    pub api_base: String,
    pub target_id: String,
    pub access_token_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            extractor: config.extractor.clone(),
            graph: SanitizedGraphConfig {
                api_base: config.graph.api_base.clone(),
                target_id: config.graph.target_id.clone(),
                access_token_configured: !config.graph.access_token.is_empty(),
                timeout_secs: config.graph.timeout_secs,
            },
            upload: config.upload.clone(),
            runner: config.runner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[graph]
access_token = "token"
target_id = "12345"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.graph.target_id, "12345");
        assert_eq!(config.database.path, PathBuf::from("crosspost.db"));
    }

    #[test]
    fn test_deserialize_with_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[graph]
access_token = "token"
target_id = "12345"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_missing_graph_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let toml = r#"
[graph]
access_token = "very-secret"
target_id = "12345"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.graph.access_token_configured);
        assert_eq!(sanitized.graph.target_id, "12345");

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("very-secret"));
    }

    #[test]
    fn test_sanitized_config_empty_token() {
        let toml = r#"
[graph]
access_token = ""
target_id = "12345"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.graph.access_token_configured);
    }
}
