//! Job API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crosspost_core::{CreateJobRequest, Job, JobFilter, JobState, RunnerError};

use crate::state::AppState;

/// Maximum allowed limit for job queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for job queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a job
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    /// Source video URL
    pub url: String,
    /// Cookies file for authenticated downloads
    pub cookies_file: Option<PathBuf>,
    /// Title prefix override
    pub title_prefix: Option<String>,
    /// Description override
    pub description: Option<String>,
    /// Upload after download (defaults to the configured auto_upload)
    pub upload: Option<bool>,
}

/// Query parameters for listing jobs
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// Filter by state type
    pub state: Option<String>,
    /// Maximum number of jobs to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for job operations
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub created_at: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub upload: bool,
    pub state: JobState,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            created_at: job.created_at.to_rfc3339(),
            source_url: job.source_url,
            cookies_file: job.cookies_file,
            title_prefix: job.title_prefix,
            description: job.description,
            upload: job.upload,
            state: job.state,
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<JobErrorResponse>);

fn error_reply(status: StatusCode, error: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(JobErrorResponse {
            error: error.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new job
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Result<(StatusCode, Json<JobResponse>), ErrorReply> {
    if body.url.trim().is_empty() {
        return Err(error_reply(StatusCode::BAD_REQUEST, "url cannot be empty"));
    }

    let request = CreateJobRequest {
        source_url: body.url,
        cookies_file: body.cookies_file,
        title_prefix: body.title_prefix,
        description: body.description,
        upload: body
            .upload
            .unwrap_or(state.config().upload.auto_upload),
    };

    match state.store().create(request) {
        Ok(job) => Ok((StatusCode::CREATED, Json(JobResponse::from(job)))),
        Err(e) => Err(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ErrorReply> {
    match state.store().get(&id) {
        Ok(Some(job)) => Ok(Json(JobResponse::from(job))),
        Ok(None) => Err(error_reply(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", id),
        )),
        Err(e) => Err(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// List jobs with optional filters
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<ListJobsResponse>, ErrorReply> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = JobFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref state_filter) = params.state {
        filter = filter.with_state(state_filter);
    }

    let jobs = state
        .store()
        .list(&filter)
        .map_err(|e| error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    // Total count without pagination
    let count_filter = JobFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter
    };
    let total = state
        .store()
        .count(&count_filter)
        .map_err(|e| error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ListJobsResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Cancel a job (DELETE endpoint)
///
/// Pending jobs cancel immediately; for a job being processed the
/// request takes effect at the next stage boundary.
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ErrorReply> {
    match state.runner().cancel(&id).await {
        Ok(job) => Ok(Json(JobResponse::from(job))),
        Err(RunnerError::JobNotFound(id)) => Err(error_reply(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", id),
        )),
        Err(RunnerError::InvalidState { operation, state }) => Err(error_reply(
            StatusCode::CONFLICT,
            format!("Cannot {} job: current state is {}", operation, state),
        )),
        Err(e) => Err(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// Kick off processing of a pending job.
///
/// Processing runs in the background; poll the job for progress. Used
/// when the background runner loop is disabled.
pub async fn process_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), ErrorReply> {
    let job = match state.store().get(&id) {
        Ok(Some(job)) => job,
        Ok(None) => {
            return Err(error_reply(
                StatusCode::NOT_FOUND,
                format!("Job not found: {}", id),
            ))
        }
        Err(e) => {
            return Err(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ))
        }
    };

    if job.state != JobState::Pending {
        return Err(error_reply(
            StatusCode::CONFLICT,
            format!(
                "Cannot process job: current state is {}",
                job.state.state_type()
            ),
        ));
    }

    let runner = Arc::clone(state.runner());
    let job_id = id.clone();
    tokio::spawn(async move {
        // The outcome lands in the store either way.
        let _ = runner.process_job(&job_id).await;
    });

    Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job))))
}
