//! Job storage trait and types.

use std::fmt;
use std::path::PathBuf;

use super::types::{Job, JobState};

/// Error type for job operations.
#[derive(Debug)]
pub enum JobError {
    /// Job not found.
    NotFound(String),
    /// Cannot perform operation due to current state.
    InvalidState {
        job_id: String,
        current_state: String,
        operation: String,
    },
    /// Database error.
    Database(String),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::NotFound(id) => write!(f, "Job not found: {}", id),
            JobError::InvalidState {
                job_id,
                current_state,
                operation,
            } => write!(
                f,
                "Cannot {} job {}: current state is {}",
                operation, job_id, current_state
            ),
            JobError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for JobError {}

/// Request to create a new job.
#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    /// Source video URL.
    pub source_url: String,
    /// Cookies file for authenticated downloads.
    pub cookies_file: Option<PathBuf>,
    /// Title prefix override.
    pub title_prefix: Option<String>,
    /// Description override.
    pub description: Option<String>,
    /// Whether to run the upload protocol after the download.
    pub upload: bool,
}

impl CreateJobRequest {
    /// Create a request with just a source URL.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            cookies_file: None,
            title_prefix: None,
            description: None,
            upload: true,
        }
    }
}

/// Filter for querying jobs.
#[derive(Debug, Clone)]
pub struct JobFilter {
    /// Filter by state type.
    pub state: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl JobFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            state: None,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by state type.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for job storage backends.
pub trait JobStore: Send + Sync {
    /// Create a new job in the Pending state.
    fn create(&self, request: CreateJobRequest) -> Result<Job, JobError>;

    /// Get a job by ID.
    fn get(&self, id: &str) -> Result<Option<Job>, JobError>;

    /// List jobs matching the filter, most recently updated first.
    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError>;

    /// Count jobs matching the filter.
    fn count(&self, filter: &JobFilter) -> Result<i64, JobError>;

    /// Update a job's state.
    fn update_state(&self, id: &str, new_state: JobState) -> Result<Job, JobError>;

    /// Permanently delete a job. Returns the deleted job if found.
    fn delete(&self, id: &str) -> Result<Job, JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder() {
        let filter = JobFilter::new()
            .with_state("pending")
            .with_limit(10)
            .with_offset(5);
        assert_eq!(filter.state.as_deref(), Some("pending"));
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 5);
    }

    #[test]
    fn test_create_request_defaults() {
        let request = CreateJobRequest::new("https://example.com/v/1");
        assert!(request.upload);
        assert!(request.cookies_file.is_none());
        assert!(request.title_prefix.is_none());
    }

    #[test]
    fn test_error_display() {
        let err = JobError::NotFound("job-1".to_string());
        assert_eq!(err.to_string(), "Job not found: job-1");

        let err = JobError::InvalidState {
            job_id: "job-2".to_string(),
            current_state: "published".to_string(),
            operation: "cancel".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot cancel job job-2: current state is published"
        );
    }
}
