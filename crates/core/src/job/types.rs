//! Core job data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::uploader::UploadStage;

/// Stage of the pipeline a failure is attributed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Extractor invocation (including the size ceiling check).
    Download,
    /// Upload session initiation.
    SessionInit,
    /// Chunk transfer.
    Transfer,
    /// Final publish call.
    Publish,
}

impl From<UploadStage> for JobStage {
    fn from(stage: UploadStage) -> Self {
        match stage {
            UploadStage::SessionInit => JobStage::SessionInit,
            UploadStage::Transfer => JobStage::Transfer,
            UploadStage::Publish => JobStage::Publish,
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStage::Download => write!(f, "download"),
            JobStage::SessionInit => write!(f, "session_init"),
            JobStage::Transfer => write!(f, "transfer"),
            JobStage::Publish => write!(f, "publish"),
        }
    }
}

/// Current state of a job.
///
/// State machine flow:
/// ```text
/// Pending -> Downloading -> Downloaded -> Uploading -> Published
///
/// Any non-terminal state can transition to Failed{stage} or Cancelled.
/// Transitions are one-directional; no stage is skipped.
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobState {
    /// Job created, waiting to be processed.
    Pending,

    /// The extractor is fetching the video.
    Downloading { started_at: DateTime<Utc> },

    /// Media file is on disk, waiting for upload (or done, when the job
    /// has uploading disabled).
    Downloaded {
        /// Path to the downloaded media file.
        media_path: PathBuf,
        /// File size in bytes.
        size_bytes: u64,
        /// Scrubbed title recovered from the source.
        title: String,
        downloaded_at: DateTime<Utc>,
    },

    /// The upload protocol is running.
    Uploading {
        /// Upload session id.
        session_id: String,
        /// Bytes acknowledged by the remote side.
        bytes_transferred: u64,
        /// Declared total size.
        total_bytes: u64,
        started_at: DateTime<Utc>,
    },

    /// Video published successfully (terminal).
    Published {
        /// Remote video id.
        video_id: String,
        /// Public URL of the published video.
        permalink: String,
        /// Title the video was published with.
        title: String,
        published_at: DateTime<Utc>,
    },

    /// Job failed (terminal), tagged with the stage that failed.
    Failed {
        stage: JobStage,
        error: String,
        failed_at: DateTime<Utc>,
    },

    /// Job was cancelled between stages (terminal).
    Cancelled { cancelled_at: DateTime<Utc> },
}

impl JobState {
    /// Returns true if this is a terminal state (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Published { .. } | JobState::Failed { .. } | JobState::Cancelled { .. }
        )
    }

    /// Returns true if the job is actively being processed.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobState::Downloading { .. } | JobState::Uploading { .. }
        )
    }

    /// Returns true if the job can be cancelled from this state.
    ///
    /// An in-flight chunk transfer is allowed to complete; the abort
    /// takes effect at the next stage boundary.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns the state type as a string (for filtering).
    pub fn state_type(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Downloading { .. } => "downloading",
            JobState::Downloaded { .. } => "downloaded",
            JobState::Uploading { .. } => "uploading",
            JobState::Published { .. } => "published",
            JobState::Failed { .. } => "failed",
            JobState::Cancelled { .. } => "cancelled",
        }
    }

    /// Returns the failed stage, when the job is in the Failed state.
    pub fn failed_stage(&self) -> Option<JobStage> {
        match self {
            JobState::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// A job representing one video to fetch and republish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Unique identifier (UUID).
    pub id: String,

    /// When the job was created.
    pub created_at: DateTime<Utc>,

    /// Source video URL.
    pub source_url: String,

    /// Cookies file for authenticated downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<PathBuf>,

    /// Title prefix override (falls back to the configured default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_prefix: Option<String>,

    /// Description override (falls back to extracted, then configured).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether to run the upload protocol after the download.
    pub upload: bool,

    /// Current state.
    pub state: JobState,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
