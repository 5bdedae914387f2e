//! Trait definitions for the upload protocol.

use async_trait::async_trait;

use super::error::UploadError;
use super::types::{AccountInfo, PublishReceipt, SessionStart, TransferAck};

/// Transport for the three-phase upload protocol.
///
/// The wire schema is owned by the remote API; implementations only
/// guarantee the phase sequencing semantics: a session is opened with a
/// declared total size, chunks are acknowledged with the next expected
/// offset, and publish makes the video live.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Returns the name of this transport implementation.
    fn name(&self) -> &str;

    /// Opens an upload session, declaring the total byte size up front.
    async fn start_session(&self, file_size: u64) -> Result<SessionStart, UploadError>;

    /// Transfers one chunk at the given offset.
    ///
    /// The acknowledgement carries the next offset the server expects,
    /// which allows resuming after a transient failure without
    /// restarting from byte 0.
    async fn transfer_chunk(
        &self,
        session_id: &str,
        offset: u64,
        bytes: Vec<u8>,
    ) -> Result<TransferAck, UploadError>;

    /// Publishes the uploaded video with title and description.
    async fn finish_session(
        &self,
        session_id: &str,
        title: &str,
        description: &str,
    ) -> Result<PublishReceipt, UploadError>;

    /// Verifies the configured credentials against the remote API.
    async fn check_token(&self) -> Result<AccountInfo, UploadError>;

    /// Public URL for a published video id.
    fn permalink(&self, video_id: &str) -> String {
        format!("https://www.facebook.com/{video_id}")
    }
}
