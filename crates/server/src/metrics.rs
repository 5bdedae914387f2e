//! Prometheus metrics for the HTTP surface.
//!
//! HTTP request metrics live here; the per-stage pipeline metrics
//! (downloads, upload sessions, job terminals) come from the core crate
//! and are registered into the same registry. Job-count gauges are
//! collected dynamically right before each scrape.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "crosspost_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("crosspost_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "crosspost_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Jobs by current state.
pub static JOBS_BY_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("crosspost_jobs_by_state", "Current job count by state"),
        &["state"],
    )
    .unwrap()
});

/// Runner running state (1 = running, 0 = stopped).
pub static RUNNER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "crosspost_runner_running",
        "Whether the job runner is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Jobs currently being processed.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "crosspost_jobs_active",
        "Number of jobs currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Jobs
    registry.register(Box::new(JOBS_BY_STATE.clone())).unwrap();
    registry.register(Box::new(RUNNER_RUNNING.clone())).unwrap();
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();

    // Core metrics (downloads, upload protocol, job terminals)
    for metric in crosspost_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the runner and the job
/// store at scrape time.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.runner().status().await;
    RUNNER_RUNNING.set(if status.running { 1 } else { 0 });
    JOBS_ACTIVE.set(status.active_jobs as i64);

    for state_type in [
        "pending",
        "downloading",
        "downloaded",
        "uploading",
        "published",
        "failed",
        "cancelled",
    ] {
        let filter = crosspost_core::JobFilter::new().with_state(state_type);
        if let Ok(count) = state.store().count(&filter) {
            JOBS_BY_STATE.with_label_values(&[state_type]).set(count);
        }
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_uuid_with_suffix() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000/process";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}/process");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/jobs/12345";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("crosspost_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_job_gauges() {
        JOBS_BY_STATE.with_label_values(&["pending"]).set(0);
        RUNNER_RUNNING.set(0);
        JOBS_ACTIVE.set(0);

        let output = encode_metrics();
        assert!(output.contains("crosspost_jobs_by_state"));
        assert!(output.contains("crosspost_runner_running"));
        assert!(output.contains("crosspost_jobs_active"));
    }
}
