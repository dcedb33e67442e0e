//! Job orchestrator implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::naming;
use super::tasks::TaskTracker;
use super::types::JobListing;
use crate::acquisition::{AcquisitionEngine, AttemptIds, ProgressReporter};
use crate::extractor::Extractor;
use crate::jobs::{Job, JobRegistry, RegistryError, SubmitOutcome};
use crate::metrics;
use crate::platform::StrategyResolver;
use crate::transcoder::AudioTranscoder;

/// Implementation of ProgressReporter that writes progress to the registry.
struct RegistryProgress {
    job_id: String,
    registry: Arc<JobRegistry>,
}

#[async_trait]
impl ProgressReporter for RegistryProgress {
    async fn report(&self, progress: u8, message: &str) {
        if let Err(e) = self.registry.update_progress(&self.job_id, progress, message) {
            debug!(job_id = %self.job_id, error = %e, "Progress update rejected");
        }
    }
}

/// Why a job run stopped early.
enum RunError {
    /// The job was cancelled; its result is discarded.
    Untracked,
    /// The job failed with a message for the user.
    Failed(String),
}

impl From<RegistryError> for RunError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(_) => RunError::Untracked,
            other => RunError::Failed(other.to_string()),
        }
    }
}

/// Everything a job task needs, shared with the orchestrator.
#[derive(Clone)]
struct JobContext {
    registry: Arc<JobRegistry>,
    resolver: Arc<StrategyResolver>,
    extractor: Arc<dyn Extractor>,
    engine: Arc<AcquisitionEngine>,
}

impl JobContext {
    async fn run(&self, job_id: &str) {
        let started = Instant::now();

        match self.execute(job_id).await {
            Ok(()) => {
                metrics::JOBS_FINISHED
                    .with_label_values(&["completed"])
                    .inc();
                info!(job_id = %job_id, elapsed_ms = started.elapsed().as_millis() as u64, "Job completed");
            }
            Err(RunError::Untracked) => {
                debug!(job_id = %job_id, "Job no longer tracked, discarding result");
            }
            Err(RunError::Failed(message)) => {
                warn!(job_id = %job_id, error = %message, "Job failed");
                match self.registry.fail(job_id, message) {
                    Ok(()) => metrics::JOBS_FINISHED.with_label_values(&["failed"]).inc(),
                    Err(RegistryError::NotFound(_)) => {
                        debug!(job_id = %job_id, "Job no longer tracked, discarding failure")
                    }
                    Err(e) => error!(job_id = %job_id, error = %e, "Failed to record job failure"),
                }
            }
        }

        metrics::JOB_DURATION.observe(started.elapsed().as_secs_f64());
    }

    async fn execute(&self, job_id: &str) -> Result<(), RunError> {
        let job = self.registry.get(job_id)?;
        let selection = job.selection().ok_or_else(|| {
            RunError::Failed("job requests neither video nor audio".to_string())
        })?;

        self.registry
            .mark_running(job_id, 10, "Fetching media info")?;

        let profile = self.resolver.resolve(&job.url);
        info!(job_id = %job_id, platform = %profile.platform, "Resolved acquisition strategy");

        let metadata = self
            .extractor
            .fetch_info(&job.url, &profile)
            .await
            .map_err(|e| RunError::Failed(format!("Failed to fetch media info: {}", e)))?;
        let title = metadata.title.clone();
        self.registry.record_metadata(job_id, metadata)?;

        self.registry
            .update_progress(job_id, 20, "Downloading media")?;

        let attempts = AttemptIds::for_job(job_id);
        let reporter = RegistryProgress {
            job_id: job_id.to_string(),
            registry: Arc::clone(&self.registry),
        };
        let assets = self
            .engine
            .acquire(&job.url, selection, &profile, &attempts, &reporter)
            .await
            .map_err(|e| RunError::Failed(e.to_string()))?;

        self.registry
            .update_progress(job_id, 90, "Finalizing files")?;

        let result = naming::publish(&assets, &title, job_id).await;
        self.registry.complete(job_id, result)?;
        Ok(())
    }
}

/// Counts a cancellation unless the job had already finished.
fn record_cancellation(job: &Job) -> bool {
    if job.status.is_terminal() {
        debug!(job_id = %job.id, status = %job.status, "Removed finished job");
        return false;
    }
    metrics::JOBS_FINISHED
        .with_label_values(&["cancelled"])
        .inc();
    true
}

/// Drives jobs from submission to a terminal state.
pub struct JobOrchestrator {
    context: JobContext,
    output_dir: PathBuf,
    tasks: TaskTracker,
}

impl JobOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        registry: Arc<JobRegistry>,
        resolver: Arc<StrategyResolver>,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn AudioTranscoder>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let output_dir = output_dir.into();
        let engine = Arc::new(AcquisitionEngine::new(
            Arc::clone(&extractor),
            transcoder,
            output_dir.clone(),
        ));

        Self {
            context: JobContext {
                registry,
                resolver,
                extractor,
                engine,
            },
            output_dir,
            tasks: TaskTracker::new(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.context.registry
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Submits a URL and spawns its job task.
    ///
    /// An in-flight job for the same URL is returned instead of a new one.
    /// Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        url: &str,
        want_video: bool,
        want_audio: bool,
    ) -> Result<SubmitOutcome, RegistryError> {
        let outcome = match self.context.registry.submit(url, want_video, want_audio) {
            Ok(outcome) => outcome,
            Err(e) => {
                metrics::JOBS_SUBMITTED.with_label_values(&["rejected"]).inc();
                return Err(e);
            }
        };

        if outcome.created {
            metrics::JOBS_SUBMITTED.with_label_values(&["created"]).inc();
            self.spawn_job(outcome.job_id.clone());
        } else {
            metrics::JOBS_SUBMITTED
                .with_label_values(&["deduplicated"])
                .inc();
        }

        Ok(outcome)
    }

    fn spawn_job(&self, job_id: String) {
        let context = self.context.clone();
        let id = job_id.clone();
        let handle = tokio::spawn(async move {
            context.run(&id).await;
        });
        self.tasks.track(job_id, handle);
    }

    /// Returns the current record of a job.
    pub fn status(&self, job_id: &str) -> Result<Job, RegistryError> {
        self.context.registry.get(job_id)
    }

    /// Untracks a job and detaches its task.
    pub fn cancel(&self, job_id: &str) -> Result<(), RegistryError> {
        let job = self.context.registry.cancel(job_id)?;
        self.tasks.detach(job_id);
        record_cancellation(&job);
        info!(job_id = %job_id, "Job cancelled");
        Ok(())
    }

    /// Lists all jobs with live counters.
    pub fn list(&self) -> JobListing {
        let jobs = self.context.registry.list();
        JobListing {
            active_jobs: self.tasks.active(),
            in_flight_urls: self.context.registry.in_flight_urls(),
            total_jobs: jobs.len(),
            jobs,
        }
    }

    /// Number of job tasks still running.
    pub fn active_jobs(&self) -> usize {
        self.tasks.active()
    }

    /// Waits for a job's task to finish. Returns false if it is not tracked.
    pub async fn wait(&self, job_id: &str) -> bool {
        self.tasks.join(job_id).await
    }

    /// Aborts all running job tasks.
    ///
    /// Their records stay non-terminal and are marked failed on next startup.
    pub fn shutdown(&self) {
        let aborted = self.tasks.abort_all();
        if aborted > 0 {
            info!(aborted, "Aborted running job tasks");
        }
    }
}
