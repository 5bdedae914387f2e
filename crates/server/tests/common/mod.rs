//! Common test utilities for API testing with mocks.
//!
//! Builds an in-process router with mock collaborators injected at both
//! seams (extractor and upload transport), so the API can be exercised
//! without a yt-dlp binary or network access.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crosspost_core::{
    load_config_from_str,
    testing::{MockExtractor, MockTransport},
    DownloadedMedia, Extractor, JobRunner, JobStore, SqliteJobStore, UploadTransport,
};
use crosspost_server::api::create_router;
use crosspost_server::state::AppState;

/// Test fixture wrapping an in-process server with mock dependencies.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Job store shared with the server
    pub store: Arc<SqliteJobStore>,
    /// Mock extractor - script download results and page listings
    pub extractor: Arc<MockExtractor>,
    /// Mock upload transport - script protocol behavior
    pub transport: Arc<MockTransport>,
    /// Temporary directory for the test database and media files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = load_config_from_str(
            r#"
[graph]
access_token = "test-token"
target_id = "1000"

[upload]
auto_upload = true
retry_delay_ms = 0

[runner]
enabled = false
"#,
        )
        .expect("Failed to parse test config");

        let store =
            Arc::new(SqliteJobStore::new(&db_path).expect("Failed to create job store"));
        let extractor = Arc::new(MockExtractor::new());
        let transport = Arc::new(MockTransport::new());

        let runner = Arc::new(JobRunner::new(
            config.runner.clone(),
            Arc::clone(&store) as Arc<dyn JobStore>,
            Arc::clone(&extractor) as Arc<dyn Extractor>,
            Arc::clone(&transport) as Arc<dyn UploadTransport>,
            config.upload.clone(),
        ));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn JobStore>,
            Arc::clone(&extractor) as Arc<dyn Extractor>,
            Arc::clone(&transport) as Arc<dyn UploadTransport>,
            runner,
        ));

        let router = create_router(state);

        Self {
            router,
            store,
            extractor,
            transport,
            temp_dir,
        }
    }

    /// Write a media file of `size` bytes and return the metadata the
    /// mock extractor should report for it.
    pub async fn media_file(&self, name: &str, size: usize, title: &str) -> DownloadedMedia {
        let path = self.temp_dir.path().join(name);
        tokio::fs::write(&path, vec![7u8; size])
            .await
            .expect("Failed to write media file");

        DownloadedMedia {
            path,
            size_bytes: size as u64,
            title: title.to_string(),
            description: String::new(),
            duration_secs: None,
            thumbnail: None,
            source_url: String::new(),
        }
    }

    /// Poll the store until the job reaches the expected state type.
    pub async fn wait_for_state(&self, job_id: &str, expected: &str, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(job)) = self.store.get(job_id) {
                let state_type = job.state.state_type();
                if state_type == expected {
                    return true;
                }
                if job.state.is_terminal() && state_type != expected {
                    return false;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a GET request and return the raw body text (for non-JSON
    /// endpoints like /metrics).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with an empty body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
