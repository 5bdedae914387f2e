//! Upload session driver.
//!
//! Sequencing and failure policy for the three-phase protocol:
//! declare the size, stream chunks resuming at the last acknowledged
//! offset, publish once every declared byte has landed. Transfer
//! failures retry at the same offset a bounded number of times;
//! credential and quota failures surface immediately.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::metrics;

use super::config::UploadConfig;
use super::error::{UploadError, UploadFailure, UploadStage};
use super::traits::UploadTransport;
use super::types::{UploadProgress, UploadReceipt};

/// An open upload session.
///
/// Tracks the declared size and the server-acknowledged offset, and
/// enforces the protocol ordering: transfers only while open, publish
/// only once complete, nothing after publish.
pub struct UploadSession {
    transport: Arc<dyn UploadTransport>,
    config: UploadConfig,
    session_id: String,
    video_id: String,
    declared_size: u64,
    offset: u64,
    published: bool,
}

impl UploadSession {
    /// Opens a session for a file of the given size.
    ///
    /// The remote side returns the offset it expects the first chunk at
    /// (normally 0, nonzero when it already holds a partial upload).
    pub async fn initiate(
        transport: Arc<dyn UploadTransport>,
        config: UploadConfig,
        declared_size: u64,
    ) -> Result<Self, UploadError> {
        let start = transport.start_session(declared_size).await?;
        metrics::UPLOAD_SESSIONS_STARTED.inc();
        debug!(
            session_id = %start.session_id,
            declared_size,
            start_offset = start.start_offset,
            "upload session opened"
        );

        Ok(Self {
            transport,
            config,
            session_id: start.session_id,
            video_id: start.video_id,
            declared_size,
            offset: start.start_offset,
            published: false,
        })
    }

    /// The session identifier assigned by the remote side.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Bytes acknowledged so far.
    pub fn bytes_transferred(&self) -> u64 {
        self.offset
    }

    /// Total size declared at initiation.
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Whether every declared byte has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.offset == self.declared_size
    }

    /// Transfers one chunk at the current offset, retrying transient
    /// failures at the same offset up to the configured bound.
    ///
    /// Returns the next offset the server expects.
    pub async fn transfer(&mut self, bytes: Vec<u8>) -> Result<u64, UploadError> {
        if self.published {
            return Err(UploadError::SessionClosed);
        }
        if bytes.is_empty() {
            return Ok(self.offset);
        }
        if self.offset + bytes.len() as u64 > self.declared_size {
            return Err(UploadError::transfer(format!(
                "chunk would exceed declared size ({} + {} > {})",
                self.offset,
                bytes.len(),
                self.declared_size
            )));
        }

        let mut attempt: u32 = 0;
        loop {
            match self
                .transport
                .transfer_chunk(&self.session_id, self.offset, bytes.clone())
                .await
            {
                Ok(ack) => {
                    if ack.next_offset <= self.offset || ack.next_offset > self.declared_size {
                        return Err(UploadError::transfer(format!(
                            "server acknowledged invalid offset {} (was at {})",
                            ack.next_offset, self.offset
                        )));
                    }
                    metrics::CHUNKS_TRANSFERRED.inc();
                    metrics::BYTES_UPLOADED.inc_by(ack.next_offset - self.offset);
                    self.offset = ack.next_offset;
                    return Ok(self.offset);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_transfer_retries => {
                    attempt += 1;
                    metrics::TRANSFER_RETRIES.inc();
                    warn!(
                        session_id = %self.session_id,
                        offset = self.offset,
                        attempt,
                        "chunk transfer failed, retrying at same offset: {e}"
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Publishes the video. Valid only once all declared bytes have been
    /// transferred; the session is terminal afterwards.
    ///
    /// Returns the published video id.
    pub async fn publish(
        &mut self,
        title: &str,
        description: &str,
    ) -> Result<String, UploadError> {
        if self.published {
            return Err(UploadError::SessionClosed);
        }
        if !self.is_complete() {
            return Err(UploadError::IncompleteUpload {
                transferred: self.offset,
                declared: self.declared_size,
            });
        }

        let receipt = match self
            .transport
            .finish_session(&self.session_id, title, description)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                metrics::PUBLISHES_TOTAL.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };

        self.published = true;
        metrics::PUBLISHES_TOTAL.with_label_values(&["success"]).inc();

        Ok(receipt.video_id.unwrap_or_else(|| self.video_id.clone()))
    }
}

/// Drives whole-file uploads over a transport.
pub struct SessionUploader {
    transport: Arc<dyn UploadTransport>,
    config: UploadConfig,
}

impl SessionUploader {
    /// Creates a new uploader.
    pub fn new(transport: Arc<dyn UploadTransport>, config: UploadConfig) -> Self {
        Self { transport, config }
    }

    /// Uploads and publishes a media file.
    pub async fn upload_file(
        &self,
        path: &Path,
        title: &str,
        description: &str,
    ) -> Result<UploadReceipt, UploadFailure> {
        self.run_upload(path, title, description, None).await
    }

    /// Uploads and publishes a media file, reporting progress after each
    /// acknowledged chunk. If the receiver is dropped, the upload
    /// continues without progress reporting.
    pub async fn upload_file_with_progress(
        &self,
        path: &Path,
        title: &str,
        description: &str,
        progress_tx: mpsc::Sender<UploadProgress>,
    ) -> Result<UploadReceipt, UploadFailure> {
        self.run_upload(path, title, description, Some(progress_tx))
            .await
    }

    async fn run_upload(
        &self,
        path: &Path,
        title: &str,
        description: &str,
        progress_tx: Option<mpsc::Sender<UploadProgress>>,
    ) -> Result<UploadReceipt, UploadFailure> {
        let started = Instant::now();
        let result = self
            .run_upload_inner(path, title, description, progress_tx)
            .await;

        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::UPLOAD_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn run_upload_inner(
        &self,
        path: &Path,
        title: &str,
        description: &str,
        progress_tx: Option<mpsc::Sender<UploadProgress>>,
    ) -> Result<UploadReceipt, UploadFailure> {
        let init_failure = |error| UploadFailure::new(UploadStage::SessionInit, error);

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                init_failure(UploadError::FileNotFound {
                    path: path.to_path_buf(),
                })
            } else {
                init_failure(UploadError::Io(e))
            }
        })?;

        let size = metadata.len();
        if size > self.config.max_file_size_bytes {
            return Err(init_failure(UploadError::FileTooLarge {
                size,
                max: self.config.max_file_size_bytes,
            }));
        }

        let mut session = UploadSession::initiate(
            Arc::clone(&self.transport),
            self.config.clone(),
            size,
        )
        .await
        .map_err(init_failure)?;

        let mut file = File::open(path)
            .await
            .map_err(|e| UploadFailure::new(UploadStage::Transfer, UploadError::Io(e)))?;

        // The server may already hold a partial upload.
        if session.bytes_transferred() > 0 {
            file.seek(SeekFrom::Start(session.bytes_transferred()))
                .await
                .map_err(|e| UploadFailure::new(UploadStage::Transfer, UploadError::Io(e)))?;
        }

        while !session.is_complete() {
            let remaining = session.declared_size() - session.bytes_transferred();
            let chunk_len = remaining.min(self.config.chunk_size_bytes) as usize;

            let mut buffer = vec![0u8; chunk_len];
            file.read_exact(&mut buffer)
                .await
                .map_err(|e| UploadFailure::new(UploadStage::Transfer, UploadError::Io(e)))?;

            let acknowledged_before = session.bytes_transferred();
            session
                .transfer(buffer)
                .await
                .map_err(|e| UploadFailure::new(UploadStage::Transfer, e))?;

            // The server may acknowledge fewer bytes than sent; rewind the
            // file cursor to the acknowledged position for the next chunk.
            let acknowledged = session.bytes_transferred();
            if acknowledged != acknowledged_before + chunk_len as u64 {
                file.seek(SeekFrom::Start(acknowledged))
                    .await
                    .map_err(|e| UploadFailure::new(UploadStage::Transfer, UploadError::Io(e)))?;
            }

            if let Some(ref tx) = progress_tx {
                let _ = tx.try_send(UploadProgress {
                    session_id: session.session_id().to_string(),
                    bytes_transferred: acknowledged,
                    total_bytes: session.declared_size(),
                });
            }
        }

        let video_id = session
            .publish(title, description)
            .await
            .map_err(|e| UploadFailure::new(UploadStage::Publish, e))?;

        Ok(UploadReceipt {
            permalink: self.transport.permalink(&video_id),
            video_id,
            title: title.to_string(),
            description: description.to_string(),
            bytes_transferred: session.declared_size(),
        })
    }
}
