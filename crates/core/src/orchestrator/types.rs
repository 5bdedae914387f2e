//! Types for the job runner.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while driving a job through the pipeline.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Job not found.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Invalid job state for the operation.
    #[error("invalid job state for {operation}: {state}")]
    InvalidState { operation: String, state: String },

    /// Job store error.
    #[error("job store error: {0}")]
    Store(#[from] crate::job::JobError),

    /// Extractor error.
    #[error("extractor error: {0}")]
    Extractor(#[from] crate::extractor::ExtractorError),

    /// Upload protocol error, tagged with the failed stage.
    #[error("upload error: {0}")]
    Upload(#[from] crate::uploader::UploadFailure),

    /// Downloaded file exceeds the configured ceiling.
    #[error("downloaded file too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    /// Job was cancelled between stages.
    #[error("job cancelled: {0}")]
    Cancelled(String),
}

/// Current status of the job runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerStatus {
    /// Whether the background loop is running.
    pub running: bool,
    /// Jobs currently being processed.
    pub active_jobs: usize,
    /// Jobs waiting to be processed.
    pub pending_count: usize,
    /// Jobs in the download stage.
    pub downloading_count: usize,
    /// Jobs in the upload stage.
    pub uploading_count: usize,
    /// Jobs published successfully.
    pub published_count: usize,
    /// Jobs that failed.
    pub failed_count: usize,
}
