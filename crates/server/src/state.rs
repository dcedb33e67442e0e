use std::path::Path;
use std::sync::Arc;

use mediagrab_core::{Config, JobOrchestrator, RetentionManager, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<JobOrchestrator>,
    retention: RetentionManager,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<JobOrchestrator>,
        retention: RetentionManager,
    ) -> Self {
        Self {
            config,
            orchestrator,
            retention,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        self.orchestrator.as_ref()
    }

    pub fn retention(&self) -> &RetentionManager {
        &self.retention
    }

    /// Directory holding the published job files.
    pub fn output_dir(&self) -> &Path {
        self.orchestrator.output_dir()
    }
}
