//! Chunked upload protocol against a Graph-API style endpoint.
//!
//! Three phases: session init (declares the total size), resumable chunk
//! transfer (each acknowledgement carries the next expected offset), and
//! publish. `SessionUploader` owns the sequencing and retry policy;
//! `GraphClient` owns the wire format.

mod config;
mod error;
mod graph;
mod session;
mod traits;
mod types;

pub use config::{GraphConfig, UploadConfig};
pub use error::{UploadError, UploadFailure, UploadStage};
pub use graph::GraphClient;
pub use session::{SessionUploader, UploadSession};
pub use traits::UploadTransport;
pub use types::{
    AccountInfo, PublishReceipt, SessionStart, TransferAck, UploadProgress, UploadReceipt,
};
