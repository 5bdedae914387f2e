//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::extractor::{
    DownloadRequest, DownloadedMedia, Extractor, ExtractorError, VideoListing,
};

/// Mock implementation of the extractor.
///
/// Provides controllable behavior for testing:
/// - scripted download results per URL
/// - scripted page listings per page URL
/// - error injection for the next fetch
/// - recorded fetch requests for assertions
#[derive(Debug, Default)]
pub struct MockExtractor {
    results: Arc<RwLock<HashMap<String, DownloadedMedia>>>,
    listings: Arc<RwLock<HashMap<String, Vec<VideoListing>>>>,
    next_error: Arc<RwLock<Option<ExtractorError>>>,
    fetches: Arc<RwLock<Vec<DownloadRequest>>>,
}

impl MockExtractor {
    /// Create a new mock extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result for a URL.
    pub async fn set_result(&self, url: impl Into<String>, media: DownloadedMedia) {
        self.results.write().await.insert(url.into(), media);
    }

    /// Script the listing for a page URL.
    pub async fn set_listing(&self, page_url: impl Into<String>, listing: Vec<VideoListing>) {
        self.listings.write().await.insert(page_url.into(), listing);
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: ExtractorError) {
        *self.next_error.write().await = Some(error);
    }

    /// All recorded fetch requests.
    pub async fn recorded_fetches(&self) -> Vec<DownloadRequest> {
        self.fetches.read().await.clone()
    }

    /// Number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: DownloadRequest) -> Result<DownloadedMedia, ExtractorError> {
        self.fetches.write().await.push(request.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.results
            .read()
            .await
            .get(&request.url)
            .cloned()
            .ok_or_else(|| {
                ExtractorError::failed(format!("no scripted result for {}", request.url), None)
            })
    }

    async fn list_videos(
        &self,
        page_url: &str,
        _cookies_file: Option<&Path>,
        max_videos: Option<usize>,
    ) -> Result<Vec<VideoListing>, ExtractorError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let mut listing = self
            .listings
            .read()
            .await
            .get(page_url)
            .cloned()
            .unwrap_or_default();

        if let Some(max) = max_videos {
            listing.truncate(max);
        }
        Ok(listing)
    }

    async fn validate(&self) -> Result<(), ExtractorError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn media(url: &str) -> DownloadedMedia {
        DownloadedMedia {
            path: PathBuf::from("/downloads/clip.mp4"),
            size_bytes: 1024,
            title: "clip".to_string(),
            description: String::new(),
            duration_secs: None,
            thumbnail: None,
            source_url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_scripted_result() {
        let extractor = MockExtractor::new();
        extractor
            .set_result("https://example.com/v/1", media("https://example.com/v/1"))
            .await;

        let result = extractor
            .fetch(DownloadRequest::new("https://example.com/v/1"))
            .await
            .unwrap();
        assert_eq!(result.size_bytes, 1024);
        assert_eq!(extractor.fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_unscripted_url_fails() {
        let extractor = MockExtractor::new();
        let result = extractor
            .fetch(DownloadRequest::new("https://example.com/unknown"))
            .await;
        assert!(matches!(result, Err(ExtractorError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_error_injection_is_consumed() {
        let extractor = MockExtractor::new();
        extractor
            .set_result("https://example.com/v/1", media("https://example.com/v/1"))
            .await;
        extractor
            .set_next_error(ExtractorError::Timeout { timeout_secs: 10 })
            .await;

        let first = extractor
            .fetch(DownloadRequest::new("https://example.com/v/1"))
            .await;
        assert!(matches!(first, Err(ExtractorError::Timeout { .. })));

        let second = extractor
            .fetch(DownloadRequest::new("https://example.com/v/1"))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_listing_truncated_to_max() {
        let extractor = MockExtractor::new();
        extractor
            .set_listing(
                "https://example.com/page/videos",
                vec![
                    VideoListing {
                        url: "https://example.com/v/1".to_string(),
                        title: "one".to_string(),
                    },
                    VideoListing {
                        url: "https://example.com/v/2".to_string(),
                        title: "two".to_string(),
                    },
                ],
            )
            .await;

        let listing = extractor
            .list_videos("https://example.com/page/videos", None, Some(1))
            .await
            .unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].title, "one");
    }
}
