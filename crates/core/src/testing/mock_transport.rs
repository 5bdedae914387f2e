//! Mock upload transport for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::uploader::{
    AccountInfo, PublishReceipt, SessionStart, TransferAck, UploadError, UploadTransport,
};

/// A recorded chunk transfer for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedChunk {
    pub session_id: String,
    pub offset: u64,
    pub len: u64,
}

/// A recorded publish call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPublish {
    pub session_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug)]
struct MockSession {
    declared_size: u64,
    received: Vec<u8>,
    published: bool,
}

/// Mock implementation of the upload transport.
///
/// Keeps an in-memory session table with byte-accurate accounting so
/// tests can verify offsets, resume behavior and the publish gate:
/// - chunks must land at the exact next expected offset
/// - publish fails unless received bytes equal the declared size
/// - error injection for each phase, including counted transfer failures
///
/// # Example
///
/// ```rust,ignore
/// use crosspost_core::testing::MockTransport;
///
/// let transport = MockTransport::new();
/// transport.fail_transfers(2).await; // next 2 chunks fail
///
/// let start = transport.start_session(1000).await?;
/// // ... transfer, publish
/// assert_eq!(transport.received_bytes(&start.session_id).await, Some(1000));
/// ```
#[derive(Debug)]
pub struct MockTransport {
    sessions: Arc<RwLock<HashMap<String, MockSession>>>,
    session_counter: Arc<RwLock<u64>>,
    chunks: Arc<RwLock<Vec<RecordedChunk>>>,
    publishes: Arc<RwLock<Vec<RecordedPublish>>>,
    /// If set, the next start_session fails with this error.
    next_start_error: Arc<RwLock<Option<UploadError>>>,
    /// Number of upcoming transfer calls that fail with a transfer error.
    transfer_failures: Arc<RwLock<u32>>,
    /// If set, the next transfer fails with this specific error.
    next_transfer_error: Arc<RwLock<Option<UploadError>>>,
    /// If set, the next finish_session fails with this error.
    next_publish_error: Arc<RwLock<Option<UploadError>>>,
    /// Offset reported by start_session (normally 0).
    initial_offset: Arc<RwLock<u64>>,
    /// Account returned by check_token.
    account: Arc<RwLock<AccountInfo>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_counter: Arc::new(RwLock::new(0)),
            chunks: Arc::new(RwLock::new(Vec::new())),
            publishes: Arc::new(RwLock::new(Vec::new())),
            next_start_error: Arc::new(RwLock::new(None)),
            transfer_failures: Arc::new(RwLock::new(0)),
            next_transfer_error: Arc::new(RwLock::new(None)),
            next_publish_error: Arc::new(RwLock::new(None)),
            initial_offset: Arc::new(RwLock::new(0)),
            account: Arc::new(RwLock::new(AccountInfo {
                id: "1000".to_string(),
                name: "Mock Account".to_string(),
            })),
        }
    }

    /// Configure the next start_session call to fail.
    pub async fn set_next_start_error(&self, error: UploadError) {
        *self.next_start_error.write().await = Some(error);
    }

    /// Make the next `count` transfer calls fail with a transfer error.
    pub async fn fail_transfers(&self, count: u32) {
        *self.transfer_failures.write().await = count;
    }

    /// Configure the next transfer call to fail with a specific error.
    pub async fn set_next_transfer_error(&self, error: UploadError) {
        *self.next_transfer_error.write().await = Some(error);
    }

    /// Configure the next finish_session call to fail.
    pub async fn set_next_publish_error(&self, error: UploadError) {
        *self.next_publish_error.write().await = Some(error);
    }

    /// Set the offset reported by start_session.
    pub async fn set_initial_offset(&self, offset: u64) {
        *self.initial_offset.write().await = offset;
    }

    /// Set the account returned by check_token.
    pub async fn set_account(&self, account: AccountInfo) {
        *self.account.write().await = account;
    }

    /// All recorded chunk transfers (including offsets of retried calls).
    pub async fn recorded_chunks(&self) -> Vec<RecordedChunk> {
        self.chunks.read().await.clone()
    }

    /// All recorded publish calls.
    pub async fn recorded_publishes(&self) -> Vec<RecordedPublish> {
        self.publishes.read().await.clone()
    }

    /// Number of sessions opened.
    pub async fn session_count(&self) -> u64 {
        *self.session_counter.read().await
    }

    /// Bytes received for a session, if it exists.
    pub async fn received_bytes(&self, session_id: &str) -> Option<u64> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|s| s.received.len() as u64)
    }

    /// The full payload received for a session, if it exists.
    pub async fn received_payload(&self, session_id: &str) -> Option<Vec<u8>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|s| s.received.clone())
    }
}

#[async_trait]
impl UploadTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start_session(&self, file_size: u64) -> Result<SessionStart, UploadError> {
        if let Some(err) = self.next_start_error.write().await.take() {
            return Err(err);
        }

        let mut counter = self.session_counter.write().await;
        *counter += 1;
        let session_id = format!("session-{}", *counter);
        let video_id = format!("video-{}", *counter);

        let initial_offset = *self.initial_offset.read().await;
        let mut received = Vec::new();
        // A nonzero initial offset models a server-side resume: those
        // bytes are already present remotely.
        received.resize(initial_offset as usize, 0);

        self.sessions.write().await.insert(
            session_id.clone(),
            MockSession {
                declared_size: file_size,
                received,
                published: false,
            },
        );

        Ok(SessionStart {
            session_id,
            video_id,
            start_offset: initial_offset,
        })
    }

    async fn transfer_chunk(
        &self,
        session_id: &str,
        offset: u64,
        bytes: Vec<u8>,
    ) -> Result<TransferAck, UploadError> {
        // Every attempt is recorded, including injected failures, so
        // tests can assert retry offsets.
        self.chunks.write().await.push(RecordedChunk {
            session_id: session_id.to_string(),
            offset,
            len: bytes.len() as u64,
        });

        if let Some(err) = self.next_transfer_error.write().await.take() {
            return Err(err);
        }

        {
            let mut failures = self.transfer_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(UploadError::transfer("injected network failure"));
            }
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| UploadError::transfer(format!("unknown session {session_id}")))?;

        if session.published {
            return Err(UploadError::transfer("session already published"));
        }

        let expected = session.received.len() as u64;
        if offset != expected {
            return Err(UploadError::transfer(format!(
                "offset mismatch: got {offset}, expected {expected}"
            )));
        }

        if expected + bytes.len() as u64 > session.declared_size {
            return Err(UploadError::transfer("chunk exceeds declared size"));
        }

        session.received.extend_from_slice(&bytes);

        Ok(TransferAck {
            next_offset: session.received.len() as u64,
        })
    }

    async fn finish_session(
        &self,
        session_id: &str,
        title: &str,
        description: &str,
    ) -> Result<PublishReceipt, UploadError> {
        if let Some(err) = self.next_publish_error.write().await.take() {
            return Err(err);
        }

        self.publishes.write().await.push(RecordedPublish {
            session_id: session_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        });

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| UploadError::publish(format!("unknown session {session_id}")))?;

        if session.published {
            return Err(UploadError::publish("session already published"));
        }

        let received = session.received.len() as u64;
        if received != session.declared_size {
            return Err(UploadError::publish(format!(
                "remote rejected publish: {received} of {} bytes received",
                session.declared_size
            )));
        }

        session.published = true;

        let video_id = session_id.replace("session-", "video-");
        Ok(PublishReceipt {
            video_id: Some(video_id),
        })
    }

    async fn check_token(&self) -> Result<AccountInfo, UploadError> {
        if let Some(err) = self.next_start_error.write().await.take() {
            return Err(err);
        }
        Ok(self.account.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let transport = MockTransport::new();

        let start = transport.start_session(10).await.unwrap();
        assert_eq!(start.start_offset, 0);

        let ack = transport
            .transfer_chunk(&start.session_id, 0, vec![1; 6])
            .await
            .unwrap();
        assert_eq!(ack.next_offset, 6);

        let ack = transport
            .transfer_chunk(&start.session_id, 6, vec![2; 4])
            .await
            .unwrap();
        assert_eq!(ack.next_offset, 10);

        let receipt = transport
            .finish_session(&start.session_id, "t", "d")
            .await
            .unwrap();
        assert_eq!(receipt.video_id, Some("video-1".to_string()));
        assert_eq!(transport.received_bytes(&start.session_id).await, Some(10));
    }

    #[tokio::test]
    async fn test_offset_mismatch_rejected() {
        let transport = MockTransport::new();
        let start = transport.start_session(10).await.unwrap();

        let result = transport
            .transfer_chunk(&start.session_id, 5, vec![1; 5])
            .await;
        assert!(matches!(result, Err(UploadError::Transfer { .. })));
    }

    #[tokio::test]
    async fn test_premature_publish_rejected() {
        let transport = MockTransport::new();
        let start = transport.start_session(10).await.unwrap();

        transport
            .transfer_chunk(&start.session_id, 0, vec![1; 4])
            .await
            .unwrap();

        let result = transport.finish_session(&start.session_id, "t", "d").await;
        assert!(matches!(result, Err(UploadError::Publish { .. })));
    }

    #[tokio::test]
    async fn test_counted_transfer_failures() {
        let transport = MockTransport::new();
        transport.fail_transfers(2).await;
        let start = transport.start_session(4).await.unwrap();

        for _ in 0..2 {
            let result = transport
                .transfer_chunk(&start.session_id, 0, vec![1; 4])
                .await;
            assert!(result.is_err());
        }

        // Third attempt succeeds
        let ack = transport
            .transfer_chunk(&start.session_id, 0, vec![1; 4])
            .await
            .unwrap();
        assert_eq!(ack.next_offset, 4);
    }

    #[tokio::test]
    async fn test_double_publish_rejected() {
        let transport = MockTransport::new();
        let start = transport.start_session(2).await.unwrap();
        transport
            .transfer_chunk(&start.session_id, 0, vec![1; 2])
            .await
            .unwrap();
        transport
            .finish_session(&start.session_id, "t", "d")
            .await
            .unwrap();

        let result = transport.finish_session(&start.session_id, "t", "d").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_initial_offset_resume() {
        let transport = MockTransport::new();
        transport.set_initial_offset(100).await;

        let start = transport.start_session(200).await.unwrap();
        assert_eq!(start.start_offset, 100);

        let ack = transport
            .transfer_chunk(&start.session_id, 100, vec![1; 100])
            .await
            .unwrap();
        assert_eq!(ack.next_offset, 200);
    }
}
