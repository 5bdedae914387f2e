//! Metadata sidecar parsing and title scrubbing.
//!
//! The extractor writes a `.info.json` sidecar next to each media file.
//! Titles scraped from Facebook listings carry engagement noise
//! ("1.6M views · 62K reactions | ... | Page Name") that must be stripped
//! before the title is re-used for publishing.

use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::error::ExtractorError;

/// Metadata recovered from the extractor's `.info.json` sidecar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SidecarMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
}

/// Returns the sidecar path for a media file ("video.mp4" -> "video.info.json").
pub fn sidecar_path(media_path: &Path) -> PathBuf {
    media_path.with_extension("info.json")
}

/// Reads and parses the metadata sidecar for a media file.
///
/// Returns `Ok(None)` when no sidecar exists; a present but unparseable
/// sidecar is a metadata error.
pub async fn read_sidecar(media_path: &Path) -> Result<Option<SidecarMetadata>, ExtractorError> {
    let path = sidecar_path(media_path);
    if !path.exists() {
        return Ok(None);
    }

    let raw = tokio::fs::read_to_string(&path).await?;
    let metadata: SidecarMetadata = serde_json::from_str(&raw)
        .map_err(|e| ExtractorError::metadata(format!("invalid sidecar {:?}: {}", path, e)))?;
    Ok(Some(metadata))
}

/// Scrubs a Facebook listing title.
///
/// Removes leading "<n> views · <n> reactions |" / "<n> views |" counters
/// and the trailing "| Page Name" segment, in either ASCII or fullwidth
/// pipe form.
pub fn scrub_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let views_reactions =
        Regex::new(r"(?i)^[\d.,]+[KMB]?\s*views\s*[·•]\s*[\d.,]+[KMB]?\s*reactions\s*[|｜]\s*")
            .expect("static regex");
    let views_only = Regex::new(r"(?i)^[\d.,]+[KMB]?\s*views\s*[|｜]\s*").expect("static regex");

    let mut cleaned = views_reactions.replace(title, "").into_owned();
    cleaned = views_only.replace(&cleaned, "").into_owned();

    // Drop the trailing account segment after the last pipe of either kind.
    if let Some(idx) = cleaned.rfind(['|', '｜']) {
        cleaned.truncate(idx);
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_views_and_reactions_prefix() {
        let title = "1.6M views · 62K reactions | The actual title | La Barbería Espiritual";
        assert_eq!(scrub_title(title), "The actual title");
    }

    #[test]
    fn test_scrub_views_only_prefix() {
        let title = "1.6M views | The actual title";
        assert_eq!(scrub_title(title), "The actual title");
    }

    #[test]
    fn test_scrub_fullwidth_separator() {
        let title = "250K views ｜ Morning session ｜ Some Page";
        assert_eq!(scrub_title(title), "Morning session");
    }

    #[test]
    fn test_scrub_mixed_separators_keeps_inner_pipe() {
        assert_eq!(scrub_title("A | B ｜ Some Page"), "A | B");
    }

    #[test]
    fn test_scrub_plain_title_untouched() {
        assert_eq!(scrub_title("Just a normal title"), "Just a normal title");
    }

    #[test]
    fn test_scrub_trailing_account_only() {
        assert_eq!(scrub_title("My video | Page Name"), "My video");
    }

    #[test]
    fn test_scrub_empty_title() {
        assert_eq!(scrub_title(""), "");
    }

    #[test]
    fn test_scrub_case_insensitive() {
        let title = "12,345 VIEWS | shouting title";
        assert_eq!(scrub_title(title), "shouting title");
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/downloads/clip.mp4")),
            PathBuf::from("/downloads/clip.info.json")
        );
    }

    #[tokio::test]
    async fn test_read_sidecar_missing_is_none() {
        let result = read_sidecar(Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_read_sidecar_parses_fields() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("clip.mp4");
        let sidecar = dir.path().join("clip.info.json");
        tokio::fs::write(
            &sidecar,
            r#"{"title": "10K views | Real title | Page", "description": "desc", "duration": 61.5, "thumbnail": "https://cdn.example/t.jpg"}"#,
        )
        .await
        .unwrap();

        let metadata = read_sidecar(&media).await.unwrap().unwrap();
        assert_eq!(metadata.description.as_deref(), Some("desc"));
        assert_eq!(metadata.duration, Some(61.5));
        assert_eq!(scrub_title(metadata.title.as_deref().unwrap()), "Real title");
    }

    #[tokio::test]
    async fn test_read_sidecar_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("clip.mp4");
        tokio::fs::write(dir.path().join("clip.info.json"), "not json")
            .await
            .unwrap();

        let result = read_sidecar(&media).await;
        assert!(matches!(result, Err(ExtractorError::Metadata { .. })));
    }
}
