//! Retention manager implementation.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::config::RetentionConfig;
use super::types::{to_hours, to_mb, CleanupOutcome, CleanupStats, FileRecord, RetentionError, StorageInfo};
use crate::metrics;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// The limits a pass enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub max_storage_bytes: u64,
    pub preserve_recent: usize,
}

impl From<&RetentionConfig> for RetentionPolicy {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            max_age: Duration::from_secs(config.file_retention_hours.saturating_mul(3600)),
            max_storage_bytes: config.max_storage_mb.saturating_mul(BYTES_PER_MB),
            preserve_recent: config.preserve_recent_files,
        }
    }
}

/// Enforces retention on the output directory.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    output_dir: PathBuf,
    policy: RetentionPolicy,
    enabled: bool,
    cleanup_on_startup: bool,
    interval: Duration,
    retry_delay: Duration,
}

impl RetentionManager {
    pub fn new(output_dir: impl Into<PathBuf>, config: &RetentionConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            policy: RetentionPolicy::from(config),
            enabled: config.enabled,
            cleanup_on_startup: config.cleanup_on_startup,
            interval: Duration::from_secs(config.check_interval_secs),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }

    /// Overrides the loop timing.
    pub fn with_schedule(mut self, interval: Duration, retry_delay: Duration) -> Self {
        self.interval = interval;
        self.retry_delay = retry_delay;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Lists eligible files, or `None` if the directory does not exist.
    ///
    /// Hidden files, directories and entries whose metadata cannot be read
    /// are skipped.
    pub fn scan(&self) -> Result<Option<Vec<FileRecord>>, RetentionError> {
        if !self.output_dir.is_dir() {
            return Ok(None);
        }

        let entries = std::fs::read_dir(&self.output_dir).map_err(|source| RetentionError::Scan {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            files.push(FileRecord {
                path: entry.path(),
                size_bytes: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        Ok(Some(files))
    }

    /// Runs one pass on the calling thread.
    pub fn run_pass_blocking(&self) -> Result<CleanupOutcome, RetentionError> {
        self.run_pass_at(SystemTime::now())
    }

    /// Runs one pass as if the current time were `now`.
    pub fn run_pass_at(&self, now: SystemTime) -> Result<CleanupOutcome, RetentionError> {
        let outcome = match self.scan()? {
            None => CleanupOutcome::NoDirectory {
                message: format!("output directory {} does not exist", self.output_dir.display()),
            },
            Some(files) if files.is_empty() => CleanupOutcome::NoFiles {
                message: "no files to clean".to_string(),
            },
            Some(files) => CleanupOutcome::Completed(execute_pass(files, &self.policy, now, |path| {
                std::fs::remove_file(path)
            })),
        };

        metrics::RETENTION_PASSES
            .with_label_values(&[outcome.label()])
            .inc();
        if let CleanupOutcome::Completed(stats) = &outcome {
            metrics::RETENTION_DELETED_FILES.inc_by(stats.deleted_files as u64);
            metrics::RETENTION_FREED_BYTES.inc_by(stats.freed_bytes);
        }

        Ok(outcome)
    }

    /// Runs one pass on the blocking thread pool.
    pub async fn run_pass(&self) -> Result<CleanupOutcome, RetentionError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.run_pass_blocking())
            .await
            .map_err(|e| RetentionError::Worker(e.to_string()))?
    }

    /// Summarizes the output directory.
    pub fn storage_info_blocking(&self) -> Result<StorageInfo, RetentionError> {
        let now = SystemTime::now();
        let files = self.scan()?;
        let directory_exists = files.is_some();
        let files = files.unwrap_or_default();

        let total_size_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
        let oldest = files.iter().map(|f| f.age(now)).max();
        let newest = files.iter().map(|f| f.age(now)).min();

        Ok(StorageInfo {
            directory_exists,
            total_files: files.len(),
            total_size_bytes,
            total_size_mb: to_mb(total_size_bytes),
            oldest_file_hours: oldest.map(to_hours),
            newest_file_hours: newest.map(to_hours),
            output_dir: self.output_dir.clone(),
        })
    }

    /// Summarizes the output directory on the blocking thread pool.
    pub async fn storage_info(&self) -> Result<StorageInfo, RetentionError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.storage_info_blocking())
            .await
            .map_err(|e| RetentionError::Worker(e.to_string()))?
    }

    /// Runs passes periodically until shutdown is signalled.
    ///
    /// A failed pass, including a missing directory, is retried after the
    /// short retry delay instead of the full interval.
    pub async fn run_loop(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled {
            info!("Retention disabled");
            return;
        }

        info!(
            output_dir = %self.output_dir.display(),
            interval_secs = self.interval.as_secs(),
            max_age_secs = self.policy.max_age.as_secs(),
            max_storage_bytes = self.policy.max_storage_bytes,
            preserve_recent = self.policy.preserve_recent,
            "Starting retention loop"
        );

        let mut delay = if self.cleanup_on_startup {
            Duration::ZERO
        } else {
            self.interval
        };

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Retention loop stopping");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            delay = match self.run_pass().await {
                Ok(CleanupOutcome::NoDirectory { message }) => {
                    warn!(%message, "Retention pass skipped");
                    self.retry_delay
                }
                Ok(CleanupOutcome::NoFiles { .. }) => {
                    debug!("Retention pass found no files");
                    self.interval
                }
                Ok(CleanupOutcome::Completed(stats)) => {
                    if stats.deleted_files > 0 || stats.failed_deletions > 0 {
                        info!(
                            deleted = stats.deleted_files,
                            failed = stats.failed_deletions,
                            freed_mb = stats.freed_space_mb,
                            remaining_bytes = stats.remaining_bytes,
                            "Retention pass completed"
                        );
                    } else {
                        debug!(total = stats.total_files, "Retention pass found nothing to delete");
                    }
                    self.interval
                }
                Err(e) => {
                    error!(error = %e, "Retention pass failed");
                    metrics::RETENTION_PASSES.with_label_values(&["error"]).inc();
                    self.retry_delay
                }
            };
        }
    }
}

/// Applies the age and budget phases to a set of files.
///
/// `delete` performs the removal; a failure is counted and the file stays in
/// the remaining total.
pub(crate) fn execute_pass(
    mut files: Vec<FileRecord>,
    policy: &RetentionPolicy,
    now: SystemTime,
    mut delete: impl FnMut(&Path) -> std::io::Result<()>,
) -> CleanupStats {
    let mut stats = CleanupStats {
        total_files: files.len(),
        ..Default::default()
    };

    // Newest first; the head is exempt.
    files.sort_by(|a, b| b.modified.cmp(&a.modified));
    let preserved_count = policy.preserve_recent.min(files.len());
    let candidates = files.split_off(preserved_count);
    let preserved = files;
    stats.preserved_files = preserved.len();

    let preserved_bytes: u64 = preserved.iter().map(|f| f.size_bytes).sum();

    // Phase 1: age.
    let mut survivors: Vec<(FileRecord, bool)> = Vec::with_capacity(candidates.len());
    let mut aged_out = 0;
    for file in candidates {
        if file.age(now) > policy.max_age {
            match delete(&file.path) {
                Ok(()) => {
                    debug!(path = %file.path.display(), "Deleted expired file");
                    stats.deleted_files += 1;
                    stats.freed_bytes += file.size_bytes;
                    aged_out += 1;
                }
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Failed to delete expired file");
                    stats.failed_deletions += 1;
                    survivors.push((file, true));
                }
            }
        } else {
            survivors.push((file, false));
        }
    }
    stats.strategy.push(format!(
        "age: deleted {} files older than {}h",
        aged_out,
        policy.max_age.as_secs() / 3600
    ));

    let mut remaining = preserved_bytes + survivors.iter().map(|(f, _)| f.size_bytes).sum::<u64>();

    // Phase 2: budget, oldest first.
    if remaining > policy.max_storage_bytes {
        let mut budget_deleted = 0;
        for (file, already_failed) in survivors.iter().rev() {
            if remaining <= policy.max_storage_bytes {
                break;
            }
            if *already_failed {
                continue;
            }
            match delete(&file.path) {
                Ok(()) => {
                    debug!(path = %file.path.display(), "Deleted file to fit storage budget");
                    stats.deleted_files += 1;
                    stats.freed_bytes += file.size_bytes;
                    remaining -= file.size_bytes;
                    budget_deleted += 1;
                }
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Failed to delete file over budget");
                    stats.failed_deletions += 1;
                }
            }
        }
        stats.strategy.push(format!(
            "budget: deleted {} files to fit {}MB",
            budget_deleted,
            policy.max_storage_bytes / BYTES_PER_MB
        ));
    }

    if stats.preserved_files > 0 {
        stats.strategy.push(format!(
            "preserved the {} most recent files",
            stats.preserved_files
        ));
    }

    stats.remaining_bytes = remaining;
    stats.freed_space_mb = to_mb(stats.freed_bytes);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn policy(max_age_hours: u64, max_storage_bytes: u64, preserve_recent: usize) -> RetentionPolicy {
        RetentionPolicy {
            max_age: HOUR * max_age_hours as u32,
            max_storage_bytes,
            preserve_recent,
        }
    }

    /// Creates a file with the given size, modified `age` ago.
    fn create_file(dir: &Path, name: &str, size: usize, age: Duration) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; size]).unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    fn manager(dir: &Path, config: RetentionConfig) -> RetentionManager {
        RetentionManager::new(dir, &config)
    }

    fn completed(outcome: CleanupOutcome) -> CleanupStats {
        match outcome {
            CleanupOutcome::Completed(stats) => stats,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_preserve_recent_with_zero_retention() {
        let dir = TempDir::new().unwrap();
        // Newest to oldest: e, d, c, b, a.
        let a = create_file(dir.path(), "a.mp4", 10, HOUR * 5);
        let b = create_file(dir.path(), "b.mp4", 10, HOUR * 4);
        let c = create_file(dir.path(), "c.mp4", 10, HOUR * 3);
        let d = create_file(dir.path(), "d.mp4", 10, HOUR * 2);
        let e = create_file(dir.path(), "e.mp4", 10, HOUR);

        let config = RetentionConfig {
            file_retention_hours: 0,
            preserve_recent_files: 2,
            ..Default::default()
        };
        let stats = completed(manager(dir.path(), config).run_pass_blocking().unwrap());

        assert_eq!(stats.total_files, 5);
        assert_eq!(stats.deleted_files, 3);
        assert_eq!(stats.preserved_files, 2);
        assert_eq!(stats.freed_bytes, 30);
        assert!(e.exists() && d.exists());
        assert!(!c.exists() && !b.exists() && !a.exists());
    }

    #[test]
    fn test_age_threshold_is_exclusive() {
        let now = SystemTime::now();
        let files = vec![
            FileRecord {
                path: PathBuf::from("exact"),
                size_bytes: 1,
                modified: now - HOUR * 24,
            },
            FileRecord {
                path: PathBuf::from("older"),
                size_bytes: 1,
                modified: now - HOUR * 24 - Duration::from_secs(1),
            },
        ];

        let mut deleted = Vec::new();
        let stats = execute_pass(files, &policy(24, u64::MAX, 0), now, |p| {
            deleted.push(p.to_path_buf());
            Ok(())
        });

        assert_eq!(deleted, vec![PathBuf::from("older")]);
        assert_eq!(stats.deleted_files, 1);
    }

    #[test]
    fn test_budget_deletes_oldest_first() {
        let dir = TempDir::new().unwrap();
        let mb = BYTES_PER_MB as usize;
        let oldest = create_file(dir.path(), "1.mp4", mb, HOUR * 4);
        let older = create_file(dir.path(), "2.mp4", mb, HOUR * 3);
        let newer = create_file(dir.path(), "3.mp4", mb, HOUR * 2);
        let newest = create_file(dir.path(), "4.mp4", mb, HOUR);

        let config = RetentionConfig {
            file_retention_hours: 24,
            max_storage_mb: 2,
            preserve_recent_files: 1,
            ..Default::default()
        };
        let stats = completed(manager(dir.path(), config).run_pass_blocking().unwrap());

        assert_eq!(stats.deleted_files, 2);
        assert_eq!(stats.remaining_bytes, 2 * BYTES_PER_MB);
        assert_eq!(stats.freed_space_mb, 2.0);
        assert!(!oldest.exists() && !older.exists());
        assert!(newer.exists() && newest.exists());
    }

    #[test]
    fn test_budget_never_touches_preserved_files() {
        let dir = TempDir::new().unwrap();
        let mb = BYTES_PER_MB as usize;
        let a = create_file(dir.path(), "a.mp4", mb, HOUR * 2);
        let b = create_file(dir.path(), "b.mp4", mb, HOUR);

        let config = RetentionConfig {
            max_storage_mb: 0,
            preserve_recent_files: 2,
            ..Default::default()
        };
        let stats = completed(manager(dir.path(), config).run_pass_blocking().unwrap());

        assert_eq!(stats.deleted_files, 0);
        assert_eq!(stats.remaining_bytes, 2 * BYTES_PER_MB);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_failed_deletion_is_counted_and_pass_continues() {
        let now = SystemTime::now();
        let files: Vec<FileRecord> = ["stuck", "gone1", "gone2"]
            .iter()
            .enumerate()
            .map(|(i, name)| FileRecord {
                path: PathBuf::from(name),
                size_bytes: 100,
                modified: now - HOUR * (48 + i as u32),
            })
            .collect();

        let stats = execute_pass(files, &policy(24, 150, 0), now, |p| {
            if p == Path::new("stuck") {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
            } else {
                Ok(())
            }
        });

        assert_eq!(stats.deleted_files, 2);
        assert_eq!(stats.failed_deletions, 1);
        // The stuck file still counts toward the remaining total.
        assert_eq!(stats.remaining_bytes, 100);
        assert_eq!(stats.freed_bytes, 200);
    }

    #[test]
    fn test_hidden_files_and_directories_are_ignored() {
        let dir = TempDir::new().unwrap();
        let hidden = create_file(dir.path(), ".jobs.json", 10, HOUR * 100);
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let old = create_file(dir.path(), "old.mp3", 10, HOUR * 100);

        let config = RetentionConfig {
            preserve_recent_files: 0,
            ..Default::default()
        };
        let stats = completed(manager(dir.path(), config).run_pass_blocking().unwrap());

        assert_eq!(stats.total_files, 1);
        assert!(hidden.exists());
        assert!(!old.exists());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_missing_directory() {
        let manager = RetentionManager::new("/nonexistent/mediagrab/out", &RetentionConfig::default());
        let outcome = manager.run_pass_blocking().unwrap();
        assert!(matches!(outcome, CleanupOutcome::NoDirectory { .. }));

        let info = manager.storage_info_blocking().unwrap();
        assert!(!info.directory_exists);
        assert_eq!(info.total_files, 0);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let outcome = manager(dir.path(), RetentionConfig::default())
            .run_pass_blocking()
            .unwrap();
        assert!(matches!(outcome, CleanupOutcome::NoFiles { .. }));
    }

    #[test]
    fn test_storage_info() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a.mp4", 1024 * 1024, HOUR * 3);
        create_file(dir.path(), "b.mp3", 512 * 1024, HOUR);

        let info = manager(dir.path(), RetentionConfig::default())
            .storage_info_blocking()
            .unwrap();

        assert!(info.directory_exists);
        assert_eq!(info.total_files, 2);
        assert_eq!(info.total_size_mb, 1.5);
        let oldest = info.oldest_file_hours.unwrap();
        let newest = info.newest_file_hours.unwrap();
        assert!((2.9..3.1).contains(&oldest));
        assert!((0.9..1.1).contains(&newest));
    }

    #[tokio::test]
    async fn test_loop_survives_missing_directory_and_recovers() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");

        let config = RetentionConfig {
            preserve_recent_files: 0,
            ..Default::default()
        };
        let manager = RetentionManager::new(&out, &config)
            .with_schedule(Duration::from_secs(3600), Duration::from_millis(20));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(manager.run_loop(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(60)).await;
        std::fs::create_dir(&out).unwrap();
        let old = create_file(&out, "old.mp4", 10, HOUR * 48);

        let mut deleted = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if !old.exists() {
                deleted = true;
                break;
            }
        }
        assert!(deleted, "retention loop did not recover after directory appeared");

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_loop_returns_immediately() {
        let config = RetentionConfig {
            enabled: false,
            ..Default::default()
        };
        let manager = RetentionManager::new("/nonexistent", &config);
        let (_tx, rx) = broadcast::channel(1);
        tokio::time::timeout(Duration::from_secs(1), manager.run_loop(rx))
            .await
            .unwrap();
    }
}
