//! Upload protocol data types.

use serde::{Deserialize, Serialize};

/// Server-side handle returned by session initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStart {
    /// Opaque session identifier, consumed by transfer and publish calls.
    pub session_id: String,
    /// Identifier the published video will carry.
    pub video_id: String,
    /// Offset the server expects the first chunk at (normally 0).
    pub start_offset: u64,
}

/// Acknowledgement of a transferred chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferAck {
    /// Next byte offset the server expects.
    pub next_offset: u64,
}

/// Result of the final publish call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Video id echoed by the publish call, when present.
    /// Falls back to the id from session initiation otherwise.
    pub video_id: Option<String>,
}

/// A successfully published video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Remote video id.
    pub video_id: String,
    /// Public URL of the published video.
    pub permalink: String,
    /// Title the video was published with.
    pub title: String,
    /// Description the video was published with.
    pub description: String,
    /// Total bytes transferred (equals the declared file size).
    pub bytes_transferred: u64,
}

/// Account info returned by a token check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
}

/// Progress of an in-flight upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadProgress {
    /// Session the progress belongs to.
    pub session_id: String,
    /// Bytes acknowledged by the server so far.
    pub bytes_transferred: u64,
    /// Declared total size.
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Progress as a percentage (0.0-100.0).
    pub fn percent(&self) -> f32 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64 * 100.0) as f32
    }
}
