//! Video extraction via an external yt-dlp binary.
//!
//! The extractor is an opaque collaborator: it turns a URL (plus optional
//! cookies) into a local media file and a metadata sidecar. Everything
//! format-related is owned by the external tool.

mod config;
mod error;
mod metadata;
mod traits;
mod types;
mod ytdlp;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use metadata::{read_sidecar, scrub_title, sidecar_path, SidecarMetadata};
pub use traits::Extractor;
pub use types::{DownloadRequest, DownloadedMedia, VideoListing};
pub use ytdlp::YtDlpExtractor;
