//! Extractor configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Directory where downloaded files are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Quality selector passed to the extractor ("best", "720p", ...).
    #[serde(default = "default_quality")]
    pub quality: String,

    /// Preferred container format ("mp4", "webm", "mkv").
    #[serde(default = "default_container")]
    pub container: String,

    /// Default cookies file for authenticated downloads.
    /// Per-request cookies take precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<PathBuf>,

    /// Write the metadata sidecar (.info.json) next to the media file.
    #[serde(default = "default_true")]
    pub write_metadata: bool,

    /// Download the thumbnail next to the media file.
    #[serde(default = "default_true")]
    pub write_thumbnail: bool,

    /// Max file size passed to the extractor, in MiB (0 = no limit).
    #[serde(default)]
    pub max_filesize_mib: u64,

    /// Download rate limit (extractor syntax, e.g. "2M").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,

    /// Retry attempts the extractor performs internally.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Timeout for a single download in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for page enumeration in seconds.
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,

    /// Additional arguments appended verbatim.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_binary_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_quality() -> String {
    "best".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_true() -> bool {
    true
}

fn default_retries() -> u32 {
    3
}

fn default_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_list_timeout() -> u64 {
    120
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            output_dir: default_output_dir(),
            quality: default_quality(),
            container: default_container(),
            cookies_file: None,
            write_metadata: true,
            write_thumbnail: true,
            max_filesize_mib: 0,
            rate_limit: None,
            retries: default_retries(),
            timeout_secs: default_timeout(),
            list_timeout_secs: default_list_timeout(),
            extra_args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtractorConfig::default();
        assert_eq!(config.binary_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.quality, "best");
        assert_eq!(config.container, "mp4");
        assert!(config.write_metadata);
        assert_eq!(config.max_filesize_mib, 0);
        assert_eq!(config.retries, 3);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            quality = "720p"
            rate_limit = "2M"
        "#;
        let config: ExtractorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.quality, "720p");
        assert_eq!(config.rate_limit.as_deref(), Some("2M"));
        assert_eq!(config.container, "mp4");
        assert_eq!(config.timeout_secs, 1800);
    }
}
