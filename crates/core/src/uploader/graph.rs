//! Graph API upload transport implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::config::GraphConfig;
use super::error::UploadError;
use super::traits::UploadTransport;
use super::types::{AccountInfo, PublishReceipt, SessionStart, TransferAck};

/// OAuth error code for an invalid or expired access token.
const CODE_INVALID_TOKEN: i64 = 190;

/// Error codes the Graph API uses for throttling and quota limits.
const QUOTA_CODES: &[i64] = &[4, 17, 32, 613];

/// Graph API client implementing the chunked upload transport.
pub struct GraphClient {
    client: Client,
    config: GraphConfig,
}

/// Error envelope returned by the Graph API.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    upload_session_id: String,
    video_id: String,
    #[serde(default)]
    start_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    #[serde(default)]
    start_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinishResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    video_id: Option<String>,
}

impl GraphClient {
    /// Create a new Graph API client.
    pub fn new(config: GraphConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Videos endpoint for the configured target.
    fn videos_url(&self) -> String {
        format!(
            "{}/{}/videos",
            self.config.api_base.trim_end_matches('/'),
            self.config.target_id
        )
    }

    /// Maps a reqwest error to the protocol taxonomy.
    fn map_request_error(e: reqwest::Error) -> UploadError {
        if e.is_timeout() {
            UploadError::transfer("request timed out")
        } else if e.is_connect() {
            UploadError::transfer(format!("connection failed: {e}"))
        } else {
            UploadError::transfer(e.to_string())
        }
    }

    /// Classifies a non-success response body into the error taxonomy.
    ///
    /// OAuth failures (code 190 or any OAuthException) are fatal auth
    /// errors; throttling codes are fatal quota errors; everything else
    /// is a retryable transfer error.
    fn classify_error(status: StatusCode, body: &str) -> UploadError {
        if let Ok(envelope) = serde_json::from_str::<GraphErrorEnvelope>(body) {
            let error = envelope.error;
            let code = error.code.unwrap_or_default();
            let is_oauth = error.kind.as_deref() == Some("OAuthException");

            if code == CODE_INVALID_TOKEN || is_oauth {
                return UploadError::auth(error.message);
            }
            if QUOTA_CODES.contains(&code) {
                return UploadError::quota(error.message);
            }
            return UploadError::transfer(format!("HTTP {status}: {}", error.message));
        }

        let snippet: String = body.chars().take(200).collect();
        UploadError::transfer(format!("HTTP {status}: {snippet}"))
    }

    /// Parses an offset field the API returns as a decimal string.
    fn parse_offset(raw: Option<&str>) -> Result<u64, UploadError> {
        match raw {
            None => Ok(0),
            Some(s) => s
                .parse::<u64>()
                .map_err(|_| UploadError::transfer(format!("unparseable offset: {s:?}"))),
        }
    }

    /// Sends a request and decodes the response, classifying failures.
    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, UploadError> {
        let response = request.send().await.map_err(Self::map_request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(Self::map_request_error)?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| UploadError::transfer(format!("unexpected response body: {e}")))
    }
}

#[async_trait]
impl UploadTransport for GraphClient {
    fn name(&self) -> &str {
        "graph"
    }

    async fn start_session(&self, file_size: u64) -> Result<SessionStart, UploadError> {
        let params = [
            ("upload_phase", "start".to_string()),
            ("file_size", file_size.to_string()),
            ("access_token", self.config.access_token.clone()),
        ];

        debug!(file_size, "initializing upload session");
        let response: StartResponse = self
            .send_json(self.client.post(self.videos_url()).form(&params))
            .await?;

        Ok(SessionStart {
            session_id: response.upload_session_id,
            video_id: response.video_id,
            start_offset: Self::parse_offset(response.start_offset.as_deref())?,
        })
    }

    async fn transfer_chunk(
        &self,
        session_id: &str,
        offset: u64,
        bytes: Vec<u8>,
    ) -> Result<TransferAck, UploadError> {
        let chunk_len = bytes.len();
        let part = multipart::Part::bytes(bytes)
            .file_name("chunk.mp4")
            .mime_str("application/octet-stream")
            .map_err(|e| UploadError::transfer(e.to_string()))?;

        let form = multipart::Form::new()
            .text("upload_phase", "transfer")
            .text("upload_session_id", session_id.to_string())
            .text("start_offset", offset.to_string())
            .text("access_token", self.config.access_token.clone())
            .part("video_file_chunk", part);

        debug!(session_id, offset, chunk_len, "transferring chunk");
        let response: TransferResponse = self
            .send_json(self.client.post(self.videos_url()).multipart(form))
            .await?;

        Ok(TransferAck {
            next_offset: Self::parse_offset(response.start_offset.as_deref())?,
        })
    }

    async fn finish_session(
        &self,
        session_id: &str,
        title: &str,
        description: &str,
    ) -> Result<PublishReceipt, UploadError> {
        let mut params = vec![
            ("upload_phase", "finish".to_string()),
            ("upload_session_id", session_id.to_string()),
            ("access_token", self.config.access_token.clone()),
        ];

        // The API treats empty strings as content, so skip blank fields.
        if !title.is_empty() {
            params.push(("title", title.to_string()));
        }
        if !description.is_empty() {
            params.push(("description", description.to_string()));
        }

        debug!(session_id, "publishing video");
        let response: FinishResponse = self
            .send_json(self.client.post(self.videos_url()).form(&params))
            .await
            .map_err(|e| match e {
                // Credential failures keep their identity; anything else
                // at this phase is a publish failure.
                UploadError::Auth { .. } | UploadError::Quota { .. } => e,
                other => UploadError::publish(other.to_string()),
            })?;

        if !response.success {
            return Err(UploadError::publish("publish call reported failure"));
        }

        Ok(PublishReceipt {
            video_id: response.video_id,
        })
    }

    async fn check_token(&self) -> Result<AccountInfo, UploadError> {
        let url = format!("{}/me", self.config.api_base.trim_end_matches('/'));
        let request = self.client.get(&url).query(&[
            ("access_token", self.config.access_token.as_str()),
            ("fields", "id,name"),
        ]);

        self.send_json(request).await
    }

    fn permalink(&self, video_id: &str) -> String {
        format!(
            "https://www.facebook.com/{}/videos/{}",
            self.config.target_id, video_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GraphConfig {
        GraphConfig {
            access_token: "token".to_string(),
            target_id: "188380891769503".to_string(),
            api_base: "https://graph.facebook.com/v19.0".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_videos_url() {
        let client = GraphClient::new(test_config());
        assert_eq!(
            client.videos_url(),
            "https://graph.facebook.com/v19.0/188380891769503/videos"
        );
    }

    #[test]
    fn test_videos_url_trims_trailing_slash() {
        let mut config = test_config();
        config.api_base = "https://graph.facebook.com/v19.0/".to_string();
        let client = GraphClient::new(config);
        assert_eq!(
            client.videos_url(),
            "https://graph.facebook.com/v19.0/188380891769503/videos"
        );
    }

    #[test]
    fn test_classify_oauth_error() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        let err = GraphClient::classify_error(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, UploadError::Auth { .. }));
    }

    #[test]
    fn test_classify_quota_error() {
        let body = r#"{"error":{"message":"Application request limit reached","type":"ApplicationLimit","code":4}}"#;
        let err = GraphClient::classify_error(StatusCode::FORBIDDEN, body);
        assert!(matches!(err, UploadError::Quota { .. }));
    }

    #[test]
    fn test_classify_unknown_error_is_transfer() {
        let body = r#"{"error":{"message":"Something broke","type":"Other","code":1}}"#;
        let err = GraphClient::classify_error(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(matches!(err, UploadError::Transfer { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_non_json_body() {
        let err = GraphClient::classify_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, UploadError::Transfer { .. }));
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(GraphClient::parse_offset(None).unwrap(), 0);
        assert_eq!(GraphClient::parse_offset(Some("600")).unwrap(), 600);
        assert!(GraphClient::parse_offset(Some("abc")).is_err());
    }

    #[test]
    fn test_permalink_includes_target() {
        let client = GraphClient::new(test_config());
        assert_eq!(
            client.permalink("987"),
            "https://www.facebook.com/188380891769503/videos/987"
        );
    }
}
