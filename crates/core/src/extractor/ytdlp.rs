//! yt-dlp based extractor implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::ExtractorConfig;
use super::error::ExtractorError;
use super::metadata::{read_sidecar, scrub_title};
use super::traits::Extractor;
use super::types::{DownloadRequest, DownloadedMedia, VideoListing};

/// Media extensions the extractor is expected to produce.
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm"];

/// yt-dlp based extractor implementation.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Creates an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Builds yt-dlp arguments for a single download.
    fn build_fetch_args(&self, request: &DownloadRequest, cookies: Option<&Path>) -> Vec<String> {
        let quality = request.quality.as_deref().unwrap_or(&self.config.quality);
        let container = request.container.as_deref().unwrap_or(&self.config.container);

        let template = self.config.output_dir.join("%(title).200s [%(id)s].%(ext)s");

        let mut args = vec![
            "--output".to_string(),
            template.to_string_lossy().to_string(),
            "--format".to_string(),
            format!("{quality}[ext={container}]/{quality}"),
            "--no-warnings".to_string(),
        ];

        if let Some(cookies) = cookies {
            args.extend([
                "--cookies".to_string(),
                cookies.to_string_lossy().to_string(),
            ]);
        }

        if self.config.write_metadata {
            args.push("--write-info-json".to_string());
        }

        if self.config.write_thumbnail {
            args.push("--write-thumbnail".to_string());
        }

        if self.config.max_filesize_mib > 0 {
            args.extend([
                "--max-filesize".to_string(),
                format!("{}M", self.config.max_filesize_mib),
            ]);
        }

        if let Some(ref rate) = self.config.rate_limit {
            args.extend(["--limit-rate".to_string(), rate.clone()]);
        }

        if self.config.retries > 0 {
            args.extend(["--retries".to_string(), self.config.retries.to_string()]);
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.push(request.url.clone());

        args
    }

    /// Builds yt-dlp arguments for flat-playlist page enumeration.
    fn build_list_args(
        &self,
        page_url: &str,
        cookies: Option<&Path>,
        max_videos: Option<usize>,
    ) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--print".to_string(),
            "url".to_string(),
            "--print".to_string(),
            "title".to_string(),
            "--no-warnings".to_string(),
        ];

        if let Some(cookies) = cookies {
            args.extend([
                "--cookies".to_string(),
                cookies.to_string_lossy().to_string(),
            ]);
        }

        if let Some(max) = max_videos {
            args.extend(["--playlist-end".to_string(), max.to_string()]);
        }

        if self.config.retries > 0 {
            args.extend(["--retries".to_string(), self.config.retries.to_string()]);
        }

        args.push(page_url.to_string());
        args
    }

    /// Parses flat-playlist output: alternating url/title lines.
    fn parse_listing_output(output: &str) -> Vec<VideoListing> {
        let lines: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let mut listings = Vec::new();
        for pair in lines.chunks(2) {
            if let [url, title] = pair {
                if url.starts_with("https://") {
                    listings.push(VideoListing {
                        url: url.to_string(),
                        title: title.to_string(),
                    });
                }
            }
        }
        listings
    }

    /// Resolves the cookies file for a request, verifying it exists.
    fn resolve_cookies(&self, request: &DownloadRequest) -> Result<Option<PathBuf>, ExtractorError> {
        let cookies = request
            .cookies_file
            .clone()
            .or_else(|| self.config.cookies_file.clone());

        if let Some(ref path) = cookies {
            if !path.exists() {
                return Err(ExtractorError::CookiesNotFound { path: path.clone() });
            }
        }
        Ok(cookies)
    }

    /// Runs the binary with the given args under a timeout.
    async fn run(
        &self,
        args: &[String],
        timeout_secs: u64,
    ) -> Result<std::process::Output, ExtractorError> {
        let mut command = Command::new(&self.config.binary_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(Duration::from_secs(timeout_secs), command.output())
            .await
            .map_err(|_| ExtractorError::Timeout { timeout_secs })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::BinaryNotFound {
                        path: self.config.binary_path.clone(),
                    }
                } else {
                    ExtractorError::Io(e)
                }
            })?;

        Ok(output)
    }

    /// Finds the newest media file produced in the output directory since `since`.
    async fn find_output_file(&self, since: SystemTime) -> Result<Option<PathBuf>, ExtractorError> {
        let mut newest: Option<(SystemTime, PathBuf)> = None;

        let mut entries = tokio::fs::read_dir(&self.config.output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_media = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| MEDIA_EXTENSIONS.contains(&e))
                .unwrap_or(false);
            if !is_media {
                continue;
            }

            let metadata = entry.metadata().await?;
            if metadata.len() == 0 {
                continue;
            }
            let modified = metadata.modified()?;
            if modified < since {
                continue;
            }

            match newest {
                Some((best, _)) if best >= modified => {}
                _ => newest = Some((modified, path)),
            }
        }

        Ok(newest.map(|(_, path)| path))
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, request: DownloadRequest) -> Result<DownloadedMedia, ExtractorError> {
        let cookies = self.resolve_cookies(&request)?;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let started = SystemTime::now();
        let args = self.build_fetch_args(&request, cookies.as_deref());
        debug!(url = %request.url, "running extractor");

        let output = self.run(&args, self.config.timeout_secs).await?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let media_path = self.find_output_file(started).await?;

        if !output.status.success() {
            // The extractor occasionally reports a nonzero exit for
            // post-processing warnings after the file landed intact.
            match media_path {
                Some(ref path) => {
                    warn!(?path, "extractor exited nonzero but produced a file");
                }
                None => {
                    return Err(ExtractorError::failed(
                        format!("extractor exited with {:?}", output.status.code()),
                        if stderr.is_empty() { None } else { Some(stderr) },
                    ));
                }
            }
        }

        let media_path = media_path.ok_or_else(|| ExtractorError::NoOutputFile {
            url: request.url.clone(),
        })?;

        let size_bytes = tokio::fs::metadata(&media_path).await?.len();

        let sidecar = read_sidecar(&media_path).await.unwrap_or_else(|e| {
            warn!("ignoring unreadable metadata sidecar: {}", e);
            None
        });

        let (title, description, duration_secs, thumbnail) = match sidecar {
            Some(meta) => (
                meta.title.as_deref().map(scrub_title),
                meta.description.unwrap_or_default(),
                meta.duration,
                meta.thumbnail,
            ),
            None => (None, String::new(), None, None),
        };

        // Fall back to the file stem when the sidecar has no usable title.
        let title = match title {
            Some(t) if !t.is_empty() => t,
            _ => media_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        };

        Ok(DownloadedMedia {
            path: media_path,
            size_bytes,
            title,
            description,
            duration_secs,
            thumbnail,
            source_url: request.url,
        })
    }

    async fn list_videos(
        &self,
        page_url: &str,
        cookies_file: Option<&Path>,
        max_videos: Option<usize>,
    ) -> Result<Vec<VideoListing>, ExtractorError> {
        if let Some(path) = cookies_file {
            if !path.exists() {
                return Err(ExtractorError::CookiesNotFound {
                    path: path.to_path_buf(),
                });
            }
        }

        let args = self.build_list_args(page_url, cookies_file, max_videos);
        let output = self.run(&args, self.config.list_timeout_secs).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ExtractorError::failed(
                format!("listing failed for {page_url}"),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::parse_listing_output(&stdout))
    }

    async fn validate(&self) -> Result<(), ExtractorError> {
        let result = Command::new(&self.config.binary_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        if let Err(e) = result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ExtractorError::BinaryNotFound {
                    path: self.config.binary_path.clone(),
                });
            }
            return Err(ExtractorError::Io(e));
        }

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor_with(config: ExtractorConfig) -> YtDlpExtractor {
        YtDlpExtractor::new(config)
    }

    #[test]
    fn test_build_fetch_args_defaults() {
        let extractor = YtDlpExtractor::with_defaults();
        let request = DownloadRequest::new("https://www.facebook.com/watch/?v=1");
        let args = extractor.build_fetch_args(&request, None);

        assert!(args.contains(&"--format".to_string()));
        assert!(args.contains(&"best[ext=mp4]/best".to_string()));
        assert!(args.contains(&"--write-info-json".to_string()));
        assert!(args.contains(&"--write-thumbnail".to_string()));
        assert!(args.contains(&"--retries".to_string()));
        assert!(args.contains(&"3".to_string()));
        // No size cap or rate limit by default
        assert!(!args.contains(&"--max-filesize".to_string()));
        assert!(!args.contains(&"--limit-rate".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.facebook.com/watch/?v=1");
    }

    #[test]
    fn test_build_fetch_args_with_cookies_and_limits() {
        let config = ExtractorConfig {
            max_filesize_mib: 512,
            rate_limit: Some("2M".to_string()),
            ..Default::default()
        };
        let extractor = extractor_with(config);
        let request = DownloadRequest::new("https://example.com/v/1");
        let args = extractor.build_fetch_args(&request, Some(Path::new("/tmp/cookies.txt")));

        assert!(args.contains(&"--cookies".to_string()));
        assert!(args.contains(&"/tmp/cookies.txt".to_string()));
        assert!(args.contains(&"--max-filesize".to_string()));
        assert!(args.contains(&"512M".to_string()));
        assert!(args.contains(&"--limit-rate".to_string()));
        assert!(args.contains(&"2M".to_string()));
    }

    #[test]
    fn test_build_fetch_args_request_overrides() {
        let extractor = YtDlpExtractor::with_defaults();
        let request = DownloadRequest {
            url: "https://example.com/v/1".to_string(),
            cookies_file: None,
            quality: Some("720p".to_string()),
            container: Some("webm".to_string()),
        };
        let args = extractor.build_fetch_args(&request, None);
        assert!(args.contains(&"720p[ext=webm]/720p".to_string()));
    }

    #[test]
    fn test_build_list_args() {
        let extractor = YtDlpExtractor::with_defaults();
        let args = extractor.build_list_args("https://www.facebook.com/page/videos", None, Some(25));

        assert!(args.contains(&"--flat-playlist".to_string()));
        assert!(args.contains(&"--playlist-end".to_string()));
        assert!(args.contains(&"25".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.facebook.com/page/videos");
    }

    #[test]
    fn test_parse_listing_output() {
        let output = "\
https://www.facebook.com/watch/?v=111
First video
https://www.facebook.com/watch/?v=222
Second video
";
        let listings = YtDlpExtractor::parse_listing_output(output);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].url, "https://www.facebook.com/watch/?v=111");
        assert_eq!(listings[1].title, "Second video");
    }

    #[test]
    fn test_parse_listing_output_skips_non_urls() {
        let output = "not-a-url\nsome title\nhttps://example.com/v/1\nreal title\n";
        let listings = YtDlpExtractor::parse_listing_output(output);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "real title");
    }

    #[tokio::test]
    async fn test_fetch_missing_cookies_fails_fast() {
        let extractor = YtDlpExtractor::with_defaults();
        let request = DownloadRequest::new("https://example.com/v/1")
            .with_cookies("/definitely/not/here.txt");
        let result = extractor.fetch(request).await;
        assert!(matches!(result, Err(ExtractorError::CookiesNotFound { .. })));
    }

    #[tokio::test]
    async fn test_validate_missing_binary() {
        let config = ExtractorConfig {
            binary_path: PathBuf::from("/nonexistent/yt-dlp"),
            ..Default::default()
        };
        let extractor = extractor_with(config);
        let result = extractor.validate().await;
        assert!(matches!(result, Err(ExtractorError::BinaryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_output_file_picks_newest_media() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let extractor = extractor_with(config);

        let since = SystemTime::now() - Duration::from_secs(5);
        tokio::fs::write(dir.path().join("old.txt"), b"ignored")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("clip.mp4"), b"data")
            .await
            .unwrap();

        let found = extractor.find_output_file(since).await.unwrap();
        assert_eq!(found, Some(dir.path().join("clip.mp4")));
    }

    #[tokio::test]
    async fn test_find_output_file_ignores_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let extractor = extractor_with(config);

        let since = SystemTime::now() - Duration::from_secs(5);
        tokio::fs::write(dir.path().join("empty.mp4"), b"")
            .await
            .unwrap();

        let found = extractor.find_output_file(since).await.unwrap();
        assert!(found.is_none());
    }
}
