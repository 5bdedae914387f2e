//! Upload protocol and Graph API configuration.

use serde::{Deserialize, Serialize};

/// Graph API connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Access token for the Graph API.
    pub access_token: String,
    /// Target profile or page id videos are published under.
    pub target_id: String,
    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds. Chunk transfers can be slow, so this
    /// is deliberately generous.
    #[serde(default = "default_graph_timeout")]
    pub timeout_secs: u32,
}

fn default_api_base() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

fn default_graph_timeout() -> u32 {
    300
}

/// Configuration for the upload session driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload automatically after each download.
    #[serde(default)]
    pub auto_upload: bool,

    /// Chunk size for transfers, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,

    /// How many times a failed chunk transfer is retried at the same
    /// offset before the error surfaces.
    #[serde(default = "default_transfer_retries")]
    pub max_transfer_retries: u32,

    /// Delay between transfer retries, in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Ceiling on the media file size, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Prefix prepended to every published title.
    #[serde(default)]
    pub default_title_prefix: String,

    /// Description used when neither the caller nor the source provides one.
    #[serde(default)]
    pub default_description: String,
}

fn default_chunk_size() -> u64 {
    4 * 1024 * 1024 // 4 MiB
}

fn default_transfer_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_max_file_size() -> u64 {
    1024 * 1024 * 1024 // 1 GiB
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            auto_upload: false,
            chunk_size_bytes: default_chunk_size(),
            max_transfer_retries: default_transfer_retries(),
            retry_delay_ms: default_retry_delay(),
            max_file_size_bytes: default_max_file_size(),
            default_title_prefix: String::new(),
            default_description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_upload_config() {
        let config = UploadConfig::default();
        assert!(!config.auto_upload);
        assert_eq!(config.chunk_size_bytes, 4 * 1024 * 1024);
        assert_eq!(config.max_transfer_retries, 3);
        assert_eq!(config.max_file_size_bytes, 1024 * 1024 * 1024);
    }

    #[test]
    fn test_deserialize_graph_config_defaults() {
        let toml = r#"
            access_token = "token"
            target_id = "12345"
        "#;
        let config: GraphConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api_base, "https://graph.facebook.com/v19.0");
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_deserialize_upload_config_partial() {
        let toml = r#"
            auto_upload = true
            max_transfer_retries = 5
            default_title_prefix = "[mirror] "
        "#;
        let config: UploadConfig = toml::from_str(toml).unwrap();
        assert!(config.auto_upload);
        assert_eq!(config.max_transfer_retries, 5);
        assert_eq!(config.default_title_prefix, "[mirror] ");
        assert_eq!(config.retry_delay_ms, 1000);
    }
}
