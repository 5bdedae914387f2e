//! Extractor data types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A request to fetch a single video.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    /// Source video URL.
    pub url: String,
    /// Cookies file for authenticated access (overrides the configured default).
    pub cookies_file: Option<PathBuf>,
    /// Quality selector override.
    pub quality: Option<String>,
    /// Container format override.
    pub container: Option<String>,
}

impl DownloadRequest {
    /// Create a request with just a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cookies_file: None,
            quality: None,
            container: None,
        }
    }

    /// Attach a cookies file.
    pub fn with_cookies(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }
}

/// A downloaded media file with its recovered metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadedMedia {
    /// Path to the media file on disk.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Video title, scrubbed of view/reaction noise.
    pub title: String,
    /// Video description (empty when the source has none).
    pub description: String,
    /// Duration in seconds, when the sidecar reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Thumbnail URL, when the sidecar reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// The URL the download was requested for.
    pub source_url: String,
}

/// A single entry discovered when enumerating a page or profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoListing {
    /// Direct URL of the video.
    pub url: String,
    /// Title as reported by the page listing.
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_request_builder() {
        let request = DownloadRequest::new("https://www.facebook.com/watch/?v=123")
            .with_cookies("/tmp/cookies.txt");
        assert_eq!(request.url, "https://www.facebook.com/watch/?v=123");
        assert_eq!(request.cookies_file, Some(PathBuf::from("/tmp/cookies.txt")));
        assert!(request.quality.is_none());
    }

    #[test]
    fn test_downloaded_media_serialization() {
        let media = DownloadedMedia {
            path: PathBuf::from("/downloads/video.mp4"),
            size_bytes: 1024,
            title: "A video".to_string(),
            description: String::new(),
            duration_secs: Some(42.0),
            thumbnail: None,
            source_url: "https://example.com/v/1".to_string(),
        };
        let json = serde_json::to_string(&media).unwrap();
        assert!(json.contains("A video"));
        // None fields are skipped
        assert!(!json.contains("thumbnail"));

        let parsed: DownloadedMedia = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, media);
    }
}
