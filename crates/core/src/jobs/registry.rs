//! In-memory job registry with snapshot persistence.

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::RegistryError;
use super::snapshot::{MemorySnapshotStore, SnapshotStore};
use super::types::{FileRef, Job, JobId, JobSnapshot, JobStatus, JobSummary, SubmitOutcome};
use crate::extractor::{AssetKind, MediaMetadata};

/// Message recorded on jobs that were in flight when the service stopped.
pub const INTERRUPTED_MESSAGE: &str = "interrupted by service restart";

#[derive(Default)]
struct RegistryState {
    jobs: HashMap<JobId, Job>,
    /// URL -> id of the non-terminal job for that URL.
    active_urls: HashMap<String, JobId>,
    /// Bumped on every mutation; orders snapshot writes.
    version: u64,
}

impl RegistryState {
    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            jobs: self
                .jobs
                .iter()
                .map(|(id, job)| (id.clone(), job.clone()))
                .collect(),
        }
    }

    fn job_mut(&mut self, id: &str) -> Result<&mut Job, RegistryError> {
        self.jobs
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Releases the URL index entry if it still points at this job.
    fn release_url(&mut self, url: &str, id: &str) {
        if self.active_urls.get(url).is_some_and(|owner| owner == id) {
            self.active_urls.remove(url);
        }
    }
}

/// The authoritative store of jobs.
///
/// Operations are synchronous and short; the snapshot is cloned under the
/// lock and written after it is released. A separate persist lock and the
/// version counter keep an older snapshot from overwriting a newer one.
pub struct JobRegistry {
    state: Mutex<RegistryState>,
    store: Arc<dyn SnapshotStore>,
    persisted_version: Mutex<u64>,
}

impl JobRegistry {
    /// Opens a registry, restoring the last snapshot from the store.
    ///
    /// Jobs that were queued or running are marked failed: no task survives
    /// a restart to finish them. An unreadable snapshot is logged and the
    /// registry starts empty.
    pub fn open(store: Arc<dyn SnapshotStore>) -> Self {
        let snapshot = match store.load() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to load job snapshot, starting empty");
                JobSnapshot::default()
            }
        };

        let mut state = RegistryState::default();
        let mut interrupted = 0;
        let now = Utc::now();

        for (id, mut job) in snapshot.jobs {
            if !job.status.is_terminal() {
                job.status = JobStatus::Failed;
                job.error = Some(INTERRUPTED_MESSAGE.to_string());
                job.message = INTERRUPTED_MESSAGE.to_string();
                job.updated_at = now;
                job.completed_at = Some(now);
                interrupted += 1;
            }
            state.jobs.insert(id, job);
        }

        info!(
            jobs = state.jobs.len(),
            interrupted, "Job registry loaded"
        );

        let registry = Self {
            state: Mutex::new(state),
            store,
            persisted_version: Mutex::new(0),
        };

        if interrupted > 0 {
            let snapshot = registry.lock_state().snapshot();
            registry.persist(0, &snapshot);
        }

        registry
    }

    /// Creates a registry backed by an in-memory store.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemorySnapshotStore::new()))
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies a mutation under the lock, then persists the resulting snapshot.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let (value, version, snapshot) = {
            let mut state = self.lock_state();
            let value = f(&mut state)?;
            state.version += 1;
            (value, state.version, state.snapshot())
        };

        self.persist(version, &snapshot);
        Ok(value)
    }

    fn persist(&self, version: u64, snapshot: &JobSnapshot) {
        let mut persisted = self
            .persisted_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if version < *persisted {
            debug!(version, persisted = *persisted, "Skipping stale snapshot");
            return;
        }

        match self.store.save(snapshot) {
            Ok(()) => *persisted = version,
            Err(e) => error!(error = %e, "Failed to persist job snapshot"),
        }
    }

    /// Submits a URL, returning the existing job if one is already in flight.
    pub fn submit(
        &self,
        url: &str,
        want_video: bool,
        want_audio: bool,
    ) -> Result<SubmitOutcome, RegistryError> {
        let url = validate_url(url)?;
        if !want_video && !want_audio {
            return Err(RegistryError::Validation(
                "at least one of video or audio must be requested".to_string(),
            ));
        }

        // Fast path: a dedup hit does not touch the snapshot.
        {
            let state = self.lock_state();
            if let Some(existing) = state.active_urls.get(&url) {
                debug!(url = %url, job_id = %existing, "URL already in flight");
                return Ok(SubmitOutcome {
                    job_id: existing.clone(),
                    created: false,
                });
            }
        }

        self.mutate(|state| {
            // Another submit may have won between the two locks.
            if let Some(existing) = state.active_urls.get(&url) {
                return Ok(SubmitOutcome {
                    job_id: existing.clone(),
                    created: false,
                });
            }

            let id = Uuid::new_v4().to_string();
            let job = Job::new(id.clone(), url.clone(), want_video, want_audio);
            state.active_urls.insert(url.clone(), id.clone());
            state.jobs.insert(id.clone(), job);
            info!(job_id = %id, url = %url, "Job submitted");

            Ok(SubmitOutcome {
                job_id: id,
                created: true,
            })
        })
    }

    /// Returns a copy of a job.
    pub fn get(&self, id: &str) -> Result<Job, RegistryError> {
        self.lock_state()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Lists all jobs, oldest first.
    pub fn list(&self) -> Vec<JobSummary> {
        let state = self.lock_state();
        let mut jobs: Vec<&Job> = state.jobs.values().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        jobs.into_iter().map(JobSummary::from).collect()
    }

    /// Number of URLs with a non-terminal job.
    pub fn in_flight_urls(&self) -> usize {
        self.lock_state().active_urls.len()
    }

    /// Total number of tracked jobs.
    pub fn len(&self) -> usize {
        self.lock_state().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops tracking a job and releases its URL.
    ///
    /// Later updates from the job's task fail with `NotFound` and are dropped.
    pub fn cancel(&self, id: &str) -> Result<Job, RegistryError> {
        self.mutate(|state| {
            let job = state
                .jobs
                .remove(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            state.release_url(&job.url, id);
            info!(job_id = %id, "Job cancelled");
            Ok(job)
        })
    }

    /// Moves a job to running.
    pub fn mark_running(&self, id: &str, progress: u8, message: &str) -> Result<(), RegistryError> {
        self.mutate(|state| {
            let job = state.job_mut(id)?;
            transition(job, JobStatus::Running)?;
            apply_progress(job, progress, message);
            Ok(())
        })
    }

    /// Records progress on a running job. Progress never decreases.
    pub fn update_progress(
        &self,
        id: &str,
        progress: u8,
        message: &str,
    ) -> Result<(), RegistryError> {
        self.mutate(|state| {
            let job = state.job_mut(id)?;
            transition(job, JobStatus::Running)?;
            apply_progress(job, progress, message);
            Ok(())
        })
    }

    /// Records metadata for a job that has none yet.
    pub fn record_metadata(&self, id: &str, metadata: MediaMetadata) -> Result<(), RegistryError> {
        self.mutate(|state| {
            let job = state.job_mut(id)?;
            if job.status.is_terminal() {
                return Err(RegistryError::InvalidTransition {
                    job_id: id.to_string(),
                    from: job.status,
                    to: job.status,
                });
            }
            if job.metadata.is_none() {
                job.metadata = Some(metadata);
                job.updated_at = Utc::now();
            }
            Ok(())
        })
    }

    /// Marks a job completed with its produced files.
    pub fn complete(
        &self,
        id: &str,
        result: BTreeMap<AssetKind, FileRef>,
    ) -> Result<(), RegistryError> {
        self.mutate(|state| {
            let job = state.job_mut(id)?;
            transition(job, JobStatus::Completed)?;
            let now = Utc::now();
            job.result = result;
            job.progress = 100;
            job.message = "Completed".to_string();
            job.updated_at = now;
            job.completed_at = Some(now);
            let url = job.url.clone();
            state.release_url(&url, id);
            Ok(())
        })
    }

    /// Marks a job failed.
    pub fn fail(&self, id: &str, error: impl Into<String>) -> Result<(), RegistryError> {
        let error = error.into();
        self.mutate(|state| {
            let job = state.job_mut(id)?;
            transition(job, JobStatus::Failed)?;
            let now = Utc::now();
            job.message = format!("Failed: {}", error);
            job.error = Some(error);
            job.updated_at = now;
            job.completed_at = Some(now);
            let url = job.url.clone();
            state.release_url(&url, id);
            Ok(())
        })
    }
}

fn transition(job: &mut Job, next: JobStatus) -> Result<(), RegistryError> {
    if !job.status.can_transition_to(next) {
        return Err(RegistryError::InvalidTransition {
            job_id: job.id.clone(),
            from: job.status,
            to: next,
        });
    }
    job.status = next;
    Ok(())
}

fn apply_progress(job: &mut Job, progress: u8, message: &str) {
    job.progress = job.progress.max(progress.min(100));
    job.message = message.to_string();
    job.updated_at = Utc::now();
}

fn validate_url(url: &str) -> Result<String, RegistryError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(RegistryError::Validation("url must not be empty".to_string()));
    }

    let lower = url.to_ascii_lowercase();
    let has_host = ["http://", "https://"]
        .iter()
        .find_map(|scheme| lower.strip_prefix(scheme))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(RegistryError::Validation(format!(
            "url must be an http(s) URL: {}",
            url
        )));
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::snapshot::JsonFileSnapshotStore;
    use crate::testing::fixtures::sample_metadata;
    use tempfile::TempDir;

    const URL: &str = "https://example.com/watch/1";

    #[test]
    fn test_submit_creates_queued_job() {
        let registry = JobRegistry::in_memory();
        let outcome = registry.submit(URL, true, true).unwrap();
        assert!(outcome.created);

        let job = registry.get(&outcome.job_id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert_eq!(job.url, URL);
        assert_eq!(registry.in_flight_urls(), 1);
    }

    #[test]
    fn test_submit_deduplicates_in_flight_url() {
        let registry = JobRegistry::in_memory();
        let first = registry.submit(URL, true, true).unwrap();
        let second = registry.submit(URL, false, true).unwrap();

        assert!(!second.created);
        assert_eq!(first.job_id, second.job_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_submit_after_terminal_creates_new_job() {
        let registry = JobRegistry::in_memory();
        let first = registry.submit(URL, true, true).unwrap();
        registry.mark_running(&first.job_id, 10, "start").unwrap();
        registry.fail(&first.job_id, "boom").unwrap();

        let second = registry.submit(URL, true, true).unwrap();
        assert!(second.created);
        assert_ne!(first.job_id, second.job_id);
    }

    #[test]
    fn test_submit_validation() {
        let registry = JobRegistry::in_memory();
        assert!(matches!(
            registry.submit("", true, true),
            Err(RegistryError::Validation(_))
        ));
        assert!(matches!(
            registry.submit("ftp://example.com/x", true, true),
            Err(RegistryError::Validation(_))
        ));
        assert!(matches!(
            registry.submit("https://", true, true),
            Err(RegistryError::Validation(_))
        ));
        assert!(matches!(
            registry.submit(URL, false, false),
            Err(RegistryError::Validation(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let registry = JobRegistry::in_memory();
        let id = registry.submit(URL, true, true).unwrap().job_id;

        registry.mark_running(&id, 10, "info").unwrap();
        registry.update_progress(&id, 50, "half").unwrap();
        registry.update_progress(&id, 20, "late update").unwrap();

        let job = registry.get(&id).unwrap();
        assert_eq!(job.progress, 50);
        assert_eq!(job.message, "late update");

        registry.update_progress(&id, 250, "clamped").unwrap();
        assert_eq!(registry.get(&id).unwrap().progress, 100);
    }

    #[test]
    fn test_terminal_jobs_reject_updates() {
        let registry = JobRegistry::in_memory();
        let id = registry.submit(URL, true, true).unwrap().job_id;
        registry.mark_running(&id, 10, "info").unwrap();
        registry.complete(&id, BTreeMap::new()).unwrap();

        assert!(matches!(
            registry.update_progress(&id, 50, "x"),
            Err(RegistryError::InvalidTransition { .. })
        ));
        assert!(matches!(
            registry.fail(&id, "late"),
            Err(RegistryError::InvalidTransition { .. })
        ));

        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.completed_at.is_some());
        assert_eq!(registry.in_flight_urls(), 0);
    }

    #[test]
    fn test_complete_records_files() {
        let registry = JobRegistry::in_memory();
        let id = registry.submit(URL, true, false).unwrap().job_id;
        registry.mark_running(&id, 10, "info").unwrap();
        registry
            .record_metadata(&id, sample_metadata("Clip"))
            .unwrap();

        let result = BTreeMap::from([(AssetKind::Video, FileRef::new("video_Clip_abcdef.mp4"))]);
        registry.complete(&id, result.clone()).unwrap();

        let job = registry.get(&id).unwrap();
        assert_eq!(job.result, result);
        assert_eq!(job.metadata.unwrap().title, "Clip");

        let summary = &registry.list()[0];
        assert_eq!(summary.files, result);
        assert_eq!(summary.title.as_deref(), Some("Clip"));
    }

    #[test]
    fn test_fail_records_error() {
        let registry = JobRegistry::in_memory();
        let id = registry.submit(URL, true, true).unwrap().job_id;
        registry.fail(&id, "extractor exploded").unwrap();

        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("extractor exploded"));
        assert!(job.message.contains("extractor exploded"));
    }

    #[test]
    fn test_cancel_untracks_and_releases_url() {
        let registry = JobRegistry::in_memory();
        let id = registry.submit(URL, true, true).unwrap().job_id;

        let cancelled = registry.cancel(&id).unwrap();
        assert_eq!(cancelled.id, id);
        assert!(matches!(registry.get(&id), Err(RegistryError::NotFound(_))));
        assert_eq!(registry.in_flight_urls(), 0);

        // Late updates from the job's task are rejected.
        assert!(matches!(
            registry.update_progress(&id, 50, "x"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(registry.cancel(&id), Err(RegistryError::NotFound(_))));

        assert!(registry.submit(URL, true, true).unwrap().created);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let store = Arc::new(MemorySnapshotStore::new());
        let registry = JobRegistry::open(store.clone());

        let id = registry.submit(URL, true, true).unwrap().job_id;
        registry.mark_running(&id, 10, "info").unwrap();
        registry.update_progress(&id, 20, "download").unwrap();

        assert_eq!(store.save_count(), 3);
        let saved = store.current().unwrap();
        assert_eq!(saved.jobs[&id].progress, 20);

        // Dedup hits and reads do not write.
        registry.submit(URL, true, true).unwrap();
        registry.get(&id).unwrap();
        assert_eq!(store.save_count(), 3);
    }

    #[test]
    fn test_restart_marks_in_flight_jobs_failed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");

        let (queued, running, done) = {
            let registry = JobRegistry::open(Arc::new(JsonFileSnapshotStore::new(&path)));
            let queued = registry.submit(URL, true, true).unwrap().job_id;
            let running = registry
                .submit("https://example.com/watch/2", true, true)
                .unwrap()
                .job_id;
            registry.mark_running(&running, 20, "download").unwrap();
            let done = registry
                .submit("https://example.com/watch/3", true, true)
                .unwrap()
                .job_id;
            registry.mark_running(&done, 10, "info").unwrap();
            registry.complete(&done, BTreeMap::new()).unwrap();
            (queued, running, done)
        };

        let registry = JobRegistry::open(Arc::new(JsonFileSnapshotStore::new(&path)));
        assert_eq!(registry.len(), 3);

        for id in [&queued, &running] {
            let job = registry.get(id).unwrap();
            assert_eq!(job.status, JobStatus::Failed);
            assert_eq!(job.error.as_deref(), Some(INTERRUPTED_MESSAGE));
        }
        assert_eq!(registry.get(&done).unwrap().status, JobStatus::Completed);

        // No URL is considered in flight after a restart.
        assert_eq!(registry.in_flight_urls(), 0);
        assert!(registry.submit(URL, true, true).unwrap().created);
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "garbage").unwrap();

        let registry = JobRegistry::open(Arc::new(JsonFileSnapshotStore::new(&path)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_is_ordered_by_creation() {
        let registry = JobRegistry::in_memory();
        let a = registry.submit("https://example.com/a", true, true).unwrap().job_id;
        let b = registry.submit("https://example.com/b", true, true).unwrap().job_id;

        let list = registry.list();
        assert_eq!(list.len(), 2);
        let ids: Vec<&str> = list.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&a.as_str()) && ids.contains(&b.as_str()));
        assert!(list[0].created_at <= list[1].created_at);
    }
}
