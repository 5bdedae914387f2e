//! Prometheus metrics for core components.
//!
//! Covers the download stage, the upload session protocol and job
//! terminal states.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Download Metrics
// =============================================================================

/// Downloads started total.
pub static DOWNLOADS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("crosspost_downloads_started_total", "Total downloads started").unwrap()
});

/// Downloads completed total.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "crosspost_downloads_completed_total",
        "Total downloads completed successfully",
    )
    .unwrap()
});

/// Downloads failed total.
pub static DOWNLOADS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "crosspost_downloads_failed_total",
        "Total downloads that failed",
    )
    .unwrap()
});

/// Download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "crosspost_download_duration_seconds",
            "Duration of downloads",
        )
        .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Upload Protocol Metrics
// =============================================================================

/// Upload sessions opened total.
pub static UPLOAD_SESSIONS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "crosspost_upload_sessions_started_total",
        "Total upload sessions opened",
    )
    .unwrap()
});

/// Chunks acknowledged by the remote side.
pub static CHUNKS_TRANSFERRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "crosspost_chunks_transferred_total",
        "Total chunks acknowledged by the upload API",
    )
    .unwrap()
});

/// Chunk transfer retries total.
pub static TRANSFER_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "crosspost_transfer_retries_total",
        "Total chunk transfer retries",
    )
    .unwrap()
});

/// Bytes acknowledged by the upload API.
pub static BYTES_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "crosspost_bytes_uploaded_total",
        "Total bytes acknowledged by the upload API",
    )
    .unwrap()
});

/// Publish calls by result.
pub static PUBLISHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("crosspost_publishes_total", "Total publish calls"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Upload duration in seconds (session open to publish).
pub static UPLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("crosspost_upload_duration_seconds", "Duration of uploads").buckets(
            vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0],
        ),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs that reached a terminal state, by state.
pub static JOBS_TERMINAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "crosspost_jobs_terminal_total",
            "Jobs that reached a terminal state",
        ),
        &["state"], // "published", "failed", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Downloads
        Box::new(DOWNLOADS_STARTED.clone()),
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(DOWNLOADS_FAILED.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        // Upload protocol
        Box::new(UPLOAD_SESSIONS_STARTED.clone()),
        Box::new(CHUNKS_TRANSFERRED.clone()),
        Box::new(TRANSFER_RETRIES.clone()),
        Box::new(BYTES_UPLOADED.clone()),
        Box::new(PUBLISHES_TOTAL.clone()),
        Box::new(UPLOAD_DURATION.clone()),
        // Jobs
        Box::new(JOBS_TERMINAL.clone()),
    ]
}
