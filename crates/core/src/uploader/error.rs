//! Error types for the upload protocol.

use std::path::PathBuf;
use thiserror::Error;

/// Protocol stage at which an upload failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    /// Session initiation (size declaration).
    SessionInit,
    /// Chunk transfer.
    Transfer,
    /// Final publish call.
    Publish,
}

impl std::fmt::Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStage::SessionInit => write!(f, "session_init"),
            UploadStage::Transfer => write!(f, "transfer"),
            UploadStage::Publish => write!(f, "publish"),
        }
    }
}

/// Errors that can occur during an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Access token missing, expired or rejected. Fatal, never retried.
    #[error("Authentication rejected: {reason}")]
    Auth { reason: String },

    /// Remote quota or rate limit hit. Fatal, never retried.
    #[error("Quota exceeded: {reason}")]
    Quota { reason: String },

    /// Transient transfer failure. Retryable at the last known offset.
    #[error("Transfer failed: {reason}")]
    Transfer { reason: String },

    /// Publish attempted before all declared bytes were transferred.
    /// An ordering bug in the caller, fatal.
    #[error("Incomplete upload: {transferred} of {declared} bytes transferred")]
    IncompleteUpload { transferred: u64, declared: u64 },

    /// The publish call was rejected.
    #[error("Publish failed: {reason}")]
    Publish { reason: String },

    /// The session already published and must not be reused.
    #[error("Upload session is closed")]
    SessionClosed,

    /// Local media file not found.
    #[error("Media file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Local media file exceeds the configured ceiling.
    #[error("Media file too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    /// I/O error while reading the media file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Creates an auth error.
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    /// Creates a quota error.
    pub fn quota(reason: impl Into<String>) -> Self {
        Self::Quota {
            reason: reason.into(),
        }
    }

    /// Creates a transfer error.
    pub fn transfer(reason: impl Into<String>) -> Self {
        Self::Transfer {
            reason: reason.into(),
        }
    }

    /// Creates a publish error.
    pub fn publish(reason: impl Into<String>) -> Self {
        Self::Publish {
            reason: reason.into(),
        }
    }

    /// Whether this error may be retried at the last known offset.
    /// Only transient transfer failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }
}

/// An upload failure tagged with the protocol stage that produced it.
#[derive(Debug, Error)]
#[error("upload failed at {stage}: {error}")]
pub struct UploadFailure {
    pub stage: UploadStage,
    #[source]
    pub error: UploadError,
}

impl UploadFailure {
    pub fn new(stage: UploadStage, error: UploadError) -> Self {
        Self { stage, error }
    }
}
