//! Tracking of spawned job tasks.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::jobs::JobId;

/// Join handles of running job tasks, keyed by job id.
#[derive(Debug, Default)]
pub struct TaskTracker {
    handles: Mutex<HashMap<JobId, JoinHandle<()>>>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tracks a task, pruning handles of tasks that already finished.
    pub fn track(&self, id: JobId, handle: JoinHandle<()>) {
        let mut handles = self.lock();
        handles.retain(|_, h| !h.is_finished());
        handles.insert(id, handle);
    }

    /// Stops tracking a task without aborting it.
    pub fn detach(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Number of tracked tasks still running.
    pub fn active(&self) -> usize {
        self.lock().values().filter(|h| !h.is_finished()).count()
    }

    /// Waits for a tracked task to finish. Returns false if it was not tracked.
    pub async fn join(&self, id: &str) -> bool {
        let handle = self.lock().remove(id);
        match handle {
            Some(handle) => {
                let _ = handle.await;
                true
            }
            None => false,
        }
    }

    /// Aborts every tracked task.
    pub fn abort_all(&self) -> usize {
        let handles: Vec<JoinHandle<()>> = self.lock().drain().map(|(_, h)| h).collect();
        let count = handles.len();
        for handle in handles {
            handle.abort();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_track_and_join() {
        let tracker = TaskTracker::new();
        tracker.track(
            "a".to_string(),
            tokio::spawn(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }),
        );
        assert_eq!(tracker.active(), 1);

        assert!(tracker.join("a").await);
        assert_eq!(tracker.active(), 0);
        assert!(!tracker.join("a").await);
    }

    #[tokio::test]
    async fn test_detach_leaves_task_running() {
        let tracker = TaskTracker::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tracker.track(
            "a".to_string(),
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let _ = tx.send(());
            }),
        );

        assert!(tracker.detach("a"));
        assert_eq!(tracker.active(), 0);
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_abort_all() {
        let tracker = TaskTracker::new();
        tracker.track(
            "a".to_string(),
            tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }),
        );
        assert_eq!(tracker.abort_all(), 1);
        assert_eq!(tracker.active(), 0);
    }
}
