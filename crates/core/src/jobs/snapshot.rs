//! Snapshot persistence for the job registry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::error::RegistryError;
use super::types::JobSnapshot;

/// Durable storage for registry snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Loads the last snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<JobSnapshot>, RegistryError>;

    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &JobSnapshot) -> Result<(), RegistryError>;
}

/// Stores the snapshot as a JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<JobSnapshot>, RegistryError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            RegistryError::Persistence(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&content).map(Some).map_err(|e| {
            RegistryError::Persistence(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, snapshot: &JobSnapshot) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RegistryError::Persistence(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| RegistryError::Persistence(format!("failed to encode snapshot: {}", e)))?;

        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|e| {
            RegistryError::Persistence(format!("failed to write {}: {}", temp.display(), e))
        })?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            RegistryError::Persistence(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// In-memory snapshot store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<JobSnapshot>>,
    saves: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a snapshot.
    pub fn with_snapshot(snapshot: JobSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    /// The last saved snapshot.
    pub fn current(&self) -> Option<JobSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of saves performed.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<JobSnapshot>, RegistryError> {
        Ok(self.current())
    }

    fn save(&self, snapshot: &JobSnapshot) -> Result<(), RegistryError> {
        *self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
