//! Trait definitions for the extractor module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ExtractorError;
use super::types::{DownloadRequest, DownloadedMedia, VideoListing};

/// An extractor that resolves a video URL into a local media file.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Fetches a single video and returns the file plus its metadata.
    async fn fetch(&self, request: DownloadRequest) -> Result<DownloadedMedia, ExtractorError>;

    /// Enumerates the videos of a page or profile without downloading them.
    async fn list_videos(
        &self,
        page_url: &str,
        cookies_file: Option<&Path>,
        max_videos: Option<usize>,
    ) -> Result<Vec<VideoListing>, ExtractorError>;

    /// Validates that the extractor is properly configured and ready.
    async fn validate(&self) -> Result<(), ExtractorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct StaticExtractor;

    #[async_trait]
    impl Extractor for StaticExtractor {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(
            &self,
            request: DownloadRequest,
        ) -> Result<DownloadedMedia, ExtractorError> {
            Ok(DownloadedMedia {
                path: PathBuf::from("/downloads/video.mp4"),
                size_bytes: 2048,
                title: "title".to_string(),
                description: String::new(),
                duration_secs: None,
                thumbnail: None,
                source_url: request.url,
            })
        }

        async fn list_videos(
            &self,
            _page_url: &str,
            _cookies_file: Option<&Path>,
            _max_videos: Option<usize>,
        ) -> Result<Vec<VideoListing>, ExtractorError> {
            Ok(vec![VideoListing {
                url: "https://example.com/v/1".to_string(),
                title: "first".to_string(),
            }])
        }

        async fn validate(&self) -> Result<(), ExtractorError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_static_extractor_fetch() {
        let extractor = StaticExtractor;
        let media = extractor
            .fetch(DownloadRequest::new("https://example.com/v/1"))
            .await
            .unwrap();
        assert_eq!(media.size_bytes, 2048);
        assert_eq!(media.source_url, "https://example.com/v/1");
    }

    #[tokio::test]
    async fn test_static_extractor_list() {
        let extractor = StaticExtractor;
        let listings = extractor
            .list_videos("https://example.com/page/videos", None, None)
            .await
            .unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "first");
    }
}
