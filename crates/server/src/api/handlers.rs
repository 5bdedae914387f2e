use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crosspost_core::{AccountInfo, RunnerStatus, SanitizedConfig, UploadError};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus scrape endpoint.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// Current runner status (job counts per state, active jobs).
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RunnerStatus> {
    Json(state.runner().status().await)
}

/// Verify the configured Graph credentials against the remote API.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccountInfo>, (StatusCode, Json<ErrorResponse>)> {
    match state.transport().check_token().await {
        Ok(account) => Ok(Json(account)),
        Err(e) => {
            let status = match e {
                UploadError::Auth { .. } => StatusCode::UNAUTHORIZED,
                UploadError::Quota { .. } => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            };
            Err((
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
