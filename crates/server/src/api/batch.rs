//! Batch API handlers.
//!
//! Enumerates the videos of a page or profile and creates one job per
//! listing. Jobs are independent from there on; one failing never
//! affects the rest.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crosspost_core::{CreateJobRequest, ExtractorError};

use super::jobs::JobResponse;
use crate::state::AppState;

/// Cap on a single batch enumeration.
const MAX_BATCH_VIDEOS: usize = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a batch
#[derive(Debug, Deserialize)]
pub struct CreateBatchBody {
    /// Page or profile URL to enumerate
    pub page_url: String,
    /// Cookies file for authenticated access
    pub cookies_file: Option<PathBuf>,
    /// Maximum videos to enumerate (capped)
    pub max_videos: Option<usize>,
    /// Title prefix applied to every created job
    pub title_prefix: Option<String>,
    /// Description applied to every created job
    pub description: Option<String>,
    /// Upload after download (defaults to the configured auto_upload)
    pub upload: Option<bool>,
}

/// Response for batch creation
#[derive(Debug, Serialize)]
pub struct CreateBatchResponse {
    pub jobs: Vec<JobResponse>,
    pub count: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct BatchErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<BatchErrorResponse>);

fn error_reply(status: StatusCode, error: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(BatchErrorResponse {
            error: error.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Enumerate a page and create a job for each discovered video
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBatchBody>,
) -> Result<(StatusCode, Json<CreateBatchResponse>), ErrorReply> {
    if body.page_url.trim().is_empty() {
        return Err(error_reply(
            StatusCode::BAD_REQUEST,
            "page_url cannot be empty",
        ));
    }

    let max_videos = body
        .max_videos
        .unwrap_or(MAX_BATCH_VIDEOS)
        .min(MAX_BATCH_VIDEOS);

    let listings = state
        .extractor()
        .list_videos(
            &body.page_url,
            body.cookies_file.as_deref(),
            Some(max_videos),
        )
        .await
        .map_err(|e| match e {
            ExtractorError::CookiesNotFound { .. } => {
                error_reply(StatusCode::BAD_REQUEST, e.to_string())
            }
            _ => error_reply(StatusCode::BAD_GATEWAY, e.to_string()),
        })?;

    let upload = body
        .upload
        .unwrap_or(state.config().upload.auto_upload);

    let mut jobs = Vec::with_capacity(listings.len());
    for listing in listings {
        let request = CreateJobRequest {
            source_url: listing.url,
            cookies_file: body.cookies_file.clone(),
            title_prefix: body.title_prefix.clone(),
            description: body.description.clone(),
            upload,
        };
        let job = state
            .store()
            .create(request)
            .map_err(|e| error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        jobs.push(JobResponse::from(job));
    }

    let count = jobs.len();
    Ok((
        StatusCode::CREATED,
        Json(CreateBatchResponse { jobs, count }),
    ))
}
