pub mod acquisition;
pub mod config;
pub mod extractor;
pub mod files;
pub mod jobs;
pub mod metrics;
pub mod orchestrator;
pub mod platform;
pub mod retention;
pub mod testing;
pub mod transcoder;

pub use acquisition::{
    AcquiredAssets, AcquisitionEngine, AcquisitionError, AttemptIds, OutputSelection,
    ProgressReporter,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use extractor::{
    AssetKind, DownloadRequest, Extractor, ExtractorConfig, ExtractorError, MediaMetadata,
    YtDlpExtractor,
};
pub use files::{content_type_for, resolve_download, FileAccessError, ServedFile};
pub use jobs::{
    FileRef, Job, JobId, JobRegistry, JobStatus, JobSummary, JsonFileSnapshotStore,
    MemorySnapshotStore, RegistryError, SnapshotStore, SubmitOutcome,
};
pub use orchestrator::{JobListing, JobOrchestrator};
pub use platform::{
    CookieDirStore, CredentialBundle, CredentialStore, FormatExpression, NoCredentials, Platform,
    StrategyProfile, StrategyResolver,
};
pub use retention::{
    CleanupOutcome, CleanupStats, RetentionConfig, RetentionError, RetentionManager, StorageInfo,
};
pub use transcoder::{AudioTranscoder, FfmpegTranscoder, TranscoderConfig, TranscoderError};
