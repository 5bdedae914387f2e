//! Job runner implementation.
//!
//! Drives jobs through the state machine:
//! Pending -> Downloading -> Downloaded -> Uploading -> Published.
//! Each job is strictly sequential inside; the runner processes many
//! jobs concurrently under a semaphore bound. One job's failure never
//! affects the rest of a batch.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::extractor::{DownloadRequest, DownloadedMedia, Extractor};
use crate::job::{Job, JobFilter, JobStage, JobState, JobStore};
use crate::metrics;
use crate::uploader::{SessionUploader, UploadConfig, UploadProgress, UploadTransport};

use super::config::RunnerConfig;
use super::types::{RunnerError, RunnerStatus};

/// The job runner - drives jobs through download and upload.
pub struct JobRunner {
    inner: Arc<RunnerInner>,
    shutdown_tx: broadcast::Sender<()>,
}

struct RunnerInner {
    config: RunnerConfig,
    upload_config: UploadConfig,
    store: Arc<dyn JobStore>,
    extractor: Arc<dyn Extractor>,
    transport: Arc<dyn UploadTransport>,
    running: AtomicBool,
    semaphore: Semaphore,
    /// Jobs currently being processed.
    active: RwLock<HashSet<String>>,
    /// Cancellation requests for active jobs, honored at stage boundaries.
    cancels: RwLock<HashSet<String>>,
}

impl JobRunner {
    /// Create a new runner.
    pub fn new(
        config: RunnerConfig,
        store: Arc<dyn JobStore>,
        extractor: Arc<dyn Extractor>,
        transport: Arc<dyn UploadTransport>,
        upload_config: UploadConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let max_concurrent = config.max_concurrent_jobs.max(1);

        Self {
            inner: Arc::new(RunnerInner {
                config,
                upload_config,
                store,
                extractor,
                transport,
                running: AtomicBool::new(false),
                semaphore: Semaphore::new(max_concurrent),
                active: RwLock::new(HashSet::new()),
                cancels: RwLock::new(HashSet::new()),
            }),
            shutdown_tx,
        }
    }

    /// Start the background processing loop.
    pub async fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            warn!("Job runner already running");
            return;
        }

        info!("Starting job runner");

        let inner = Arc::clone(&self.inner);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Job processing loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Job processing loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(inner.config.poll_interval_ms)) => {
                        if !inner.running.load(Ordering::Relaxed) {
                            break;
                        }
                        inner.poll_pending().await;
                    }
                }
            }
            info!("Job processing loop stopped");
        });
    }

    /// Stop the runner gracefully. In-flight chunk transfers complete
    /// before their jobs observe the stop.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            warn!("Job runner not running");
            return;
        }

        info!("Stopping job runner");
        let _ = self.shutdown_tx.send(());
    }

    /// Process a single job end-to-end.
    pub async fn process_job(&self, job_id: &str) -> Result<Job, RunnerError> {
        self.inner.process(job_id.to_string()).await
    }

    /// Process a batch of jobs with bounded parallelism.
    ///
    /// Every job gets an independent result; a failed job never aborts
    /// the rest of the batch.
    pub async fn run_batch(
        &self,
        job_ids: Vec<String>,
    ) -> Vec<(String, Result<Job, RunnerError>)> {
        let futures = job_ids.into_iter().map(|id| {
            let inner = Arc::clone(&self.inner);
            async move {
                let result = inner.process(id.clone()).await;
                (id, result)
            }
        });

        futures::future::join_all(futures).await
    }

    /// Request cancellation of a job.
    ///
    /// Idle jobs are cancelled immediately. For a job being processed,
    /// the request is honored at the next stage boundary; an in-flight
    /// chunk transfer is allowed to complete or fail first.
    pub async fn cancel(&self, job_id: &str) -> Result<Job, RunnerError> {
        let job = self
            .inner
            .store
            .get(job_id)?
            .ok_or_else(|| RunnerError::JobNotFound(job_id.to_string()))?;

        if job.state.is_terminal() {
            return Err(RunnerError::InvalidState {
                operation: "cancel".to_string(),
                state: job.state.state_type().to_string(),
            });
        }

        let is_active = self.inner.active.read().await.contains(job_id);
        if is_active {
            self.inner.cancels.write().await.insert(job_id.to_string());
            debug!(job_id, "cancellation requested for active job");
            Ok(job)
        } else {
            let updated = self.inner.store.update_state(
                job_id,
                JobState::Cancelled {
                    cancelled_at: Utc::now(),
                },
            )?;
            metrics::JOBS_TERMINAL.with_label_values(&["cancelled"]).inc();
            Ok(updated)
        }
    }

    /// Get current runner status.
    pub async fn status(&self) -> RunnerStatus {
        let count = |state: &str| {
            self.inner
                .store
                .count(&JobFilter::new().with_state(state))
                .unwrap_or(0) as usize
        };

        RunnerStatus {
            running: self.inner.running.load(Ordering::Relaxed),
            active_jobs: self.inner.active.read().await.len(),
            pending_count: count("pending"),
            downloading_count: count("downloading"),
            uploading_count: count("uploading"),
            published_count: count("published"),
            failed_count: count("failed"),
        }
    }
}

impl RunnerInner {
    /// Pick up pending jobs and spawn processing tasks for them.
    async fn poll_pending(self: &Arc<Self>) {
        let filter = JobFilter::new()
            .with_state("pending")
            .with_limit((self.config.max_concurrent_jobs * 2) as i64);

        let pending = match self.store.list(&filter) {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Failed to list pending jobs: {}", e);
                return;
            }
        };

        for job in pending {
            if self.active.read().await.contains(&job.id) {
                continue;
            }

            let inner = Arc::clone(self);
            tokio::spawn(async move {
                let job_id = job.id.clone();
                if let Err(e) = inner.process(job.id).await {
                    // Per-job failures are recorded in the store; the
                    // loop keeps going.
                    debug!(job_id, "job processing ended with error: {}", e);
                }
            });
        }
    }

    /// Process one job: claim it, then drive it through the stages.
    async fn process(self: &Arc<Self>, job_id: String) -> Result<Job, RunnerError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("runner semaphore closed");

        {
            let mut active = self.active.write().await;
            if !active.insert(job_id.clone()) {
                return Err(RunnerError::InvalidState {
                    operation: "process".to_string(),
                    state: "processing".to_string(),
                });
            }
        }

        let result = self.process_claimed(&job_id).await;

        self.active.write().await.remove(&job_id);
        self.cancels.write().await.remove(&job_id);

        result
    }

    async fn process_claimed(&self, job_id: &str) -> Result<Job, RunnerError> {
        let job = self
            .store
            .get(job_id)?
            .ok_or_else(|| RunnerError::JobNotFound(job_id.to_string()))?;

        if job.state != JobState::Pending {
            return Err(RunnerError::InvalidState {
                operation: "process".to_string(),
                state: job.state.state_type().to_string(),
            });
        }

        // Stage 1: download.
        let media = self.download(&job).await?;

        if self.take_cancel(job_id).await {
            return self.cancel_now(job_id).await;
        }

        self.store.update_state(
            job_id,
            JobState::Downloaded {
                media_path: media.path.clone(),
                size_bytes: media.size_bytes,
                title: media.title.clone(),
                downloaded_at: Utc::now(),
            },
        )?;

        if !job.upload {
            debug!(job_id, "upload disabled for job, stopping after download");
            return self
                .store
                .get(job_id)?
                .ok_or_else(|| RunnerError::JobNotFound(job_id.to_string()));
        }

        // Stage 2: upload and publish.
        self.upload(&job, &media).await
    }

    /// Runs the extractor and enforces the size ceiling. A failure here
    /// never touches the upload transport.
    async fn download(&self, job: &Job) -> Result<DownloadedMedia, RunnerError> {
        self.store.update_state(
            &job.id,
            JobState::Downloading {
                started_at: Utc::now(),
            },
        )?;
        metrics::DOWNLOADS_STARTED.inc();

        let request = DownloadRequest {
            url: job.source_url.clone(),
            cookies_file: job.cookies_file.clone(),
            quality: None,
            container: None,
        };

        let started = Instant::now();
        let media = match self.extractor.fetch(request).await {
            Ok(media) => media,
            Err(e) => {
                metrics::DOWNLOADS_FAILED.inc();
                metrics::DOWNLOAD_DURATION
                    .with_label_values(&["failed"])
                    .observe(started.elapsed().as_secs_f64());
                self.fail_job(&job.id, JobStage::Download, &e.to_string())?;
                return Err(RunnerError::Extractor(e));
            }
        };

        metrics::DOWNLOADS_COMPLETED.inc();
        metrics::DOWNLOAD_DURATION
            .with_label_values(&["success"])
            .observe(started.elapsed().as_secs_f64());

        let max = self.upload_config.max_file_size_bytes;
        if media.size_bytes > max {
            let error = RunnerError::FileTooLarge {
                size: media.size_bytes,
                max,
            };
            self.fail_job(&job.id, JobStage::Download, &error.to_string())?;
            return Err(error);
        }

        Ok(media)
    }

    async fn upload(&self, job: &Job, media: &DownloadedMedia) -> Result<Job, RunnerError> {
        let title = compose_title(job, media, &self.upload_config);
        let description = compose_description(job, media, &self.upload_config);

        let started_at = Utc::now();
        self.store.update_state(
            &job.id,
            JobState::Uploading {
                session_id: String::new(),
                bytes_transferred: 0,
                total_bytes: media.size_bytes,
                started_at,
            },
        )?;

        // Persist acknowledged progress so status polling sees it.
        let (progress_tx, mut progress_rx) = mpsc::channel::<UploadProgress>(16);
        let store = Arc::clone(&self.store);
        let progress_job_id = job.id.clone();
        let progress_task = tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                let _ = store.update_state(
                    &progress_job_id,
                    JobState::Uploading {
                        session_id: progress.session_id,
                        bytes_transferred: progress.bytes_transferred,
                        total_bytes: progress.total_bytes,
                        started_at,
                    },
                );
            }
        });

        let uploader =
            SessionUploader::new(Arc::clone(&self.transport), self.upload_config.clone());
        let result = uploader
            .upload_file_with_progress(&media.path, &title, &description, progress_tx)
            .await;

        // Drain queued progress updates before writing the terminal state.
        let _ = progress_task.await;

        match result {
            Ok(receipt) => {
                let updated = self.store.update_state(
                    &job.id,
                    JobState::Published {
                        video_id: receipt.video_id,
                        permalink: receipt.permalink,
                        title: receipt.title,
                        published_at: Utc::now(),
                    },
                )?;
                metrics::JOBS_TERMINAL.with_label_values(&["published"]).inc();
                info!(job_id = %job.id, "job published");
                Ok(updated)
            }
            Err(failure) => {
                self.fail_job(&job.id, failure.stage.into(), &failure.to_string())?;
                Err(RunnerError::Upload(failure))
            }
        }
    }

    /// Marks a job failed at a stage.
    fn fail_job(&self, job_id: &str, stage: JobStage, error: &str) -> Result<(), RunnerError> {
        warn!(job_id, %stage, "job failed: {error}");
        self.store.update_state(
            job_id,
            JobState::Failed {
                stage,
                error: error.to_string(),
                failed_at: Utc::now(),
            },
        )?;
        metrics::JOBS_TERMINAL.with_label_values(&["failed"]).inc();
        Ok(())
    }

    /// Takes a pending cancellation request for a job, if any.
    async fn take_cancel(&self, job_id: &str) -> bool {
        self.cancels.write().await.remove(job_id)
    }

    async fn cancel_now(&self, job_id: &str) -> Result<Job, RunnerError> {
        self.store.update_state(
            job_id,
            JobState::Cancelled {
                cancelled_at: Utc::now(),
            },
        )?;
        metrics::JOBS_TERMINAL.with_label_values(&["cancelled"]).inc();
        Err(RunnerError::Cancelled(job_id.to_string()))
    }
}

/// Composes the published title: per-job prefix (falling back to the
/// configured default) plus the extracted title.
fn compose_title(job: &Job, media: &DownloadedMedia, config: &UploadConfig) -> String {
    let base = if media.title.is_empty() {
        "Downloaded Video"
    } else {
        &media.title
    };
    let prefix = job
        .title_prefix
        .as_deref()
        .unwrap_or(&config.default_title_prefix);
    format!("{prefix}{base}")
}

/// Composes the published description: explicit per-job value, then the
/// extracted description, then the configured default.
fn compose_description(job: &Job, media: &DownloadedMedia, config: &UploadConfig) -> String {
    if let Some(ref description) = job.description {
        if !description.is_empty() {
            return description.clone();
        }
    }
    if !media.description.is_empty() {
        return media.description.clone();
    }
    config.default_description.clone()
}
