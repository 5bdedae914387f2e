//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching a video.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Extractor binary not found.
    #[error("Extractor binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Cookies file does not exist.
    #[error("Cookies file not found: {path}")]
    CookiesNotFound { path: PathBuf },

    /// The extractor process exited with a failure.
    #[error("Extraction failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// The extractor ran past the configured timeout.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The extractor reported success but no media file appeared.
    #[error("No output file produced for {url}")]
    NoOutputFile { url: String },

    /// The metadata sidecar could not be parsed.
    #[error("Failed to read media metadata: {reason}")]
    Metadata { reason: String },

    /// I/O error during extraction.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Creates a new extraction failed error with stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new metadata error.
    pub fn metadata(reason: impl Into<String>) -> Self {
        Self::Metadata {
            reason: reason.into(),
        }
    }
}
