pub mod config;
pub mod extractor;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod testing;
pub mod uploader;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use extractor::{
    DownloadRequest, DownloadedMedia, Extractor, ExtractorConfig, ExtractorError, VideoListing,
    YtDlpExtractor,
};
pub use job::{CreateJobRequest, Job, JobError, JobFilter, JobStage, JobState, JobStore, SqliteJobStore};
pub use orchestrator::{JobRunner, RunnerConfig, RunnerError, RunnerStatus};
pub use uploader::{
    AccountInfo, GraphClient, GraphConfig, SessionUploader, UploadConfig, UploadError,
    UploadFailure, UploadProgress, UploadReceipt, UploadSession, UploadStage, UploadTransport,
};
