//! Job lifecycle integration tests.
//!
//! These tests drive jobs through the orchestrator with mock tools:
//! queued -> running -> completed | failed

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use mediagrab_core::{
    testing::{MockBehavior, MockExtractor, MockTranscoder, StaticCredentialStore},
    AssetKind, CleanupOutcome, CredentialStore, ExtractorConfig, Job, JobOrchestrator,
    JobRegistry, JobStatus, JsonFileSnapshotStore, NoCredentials, Platform, RetentionConfig,
    RetentionManager, StrategyResolver,
};

/// Test helper owning the mocks and a temporary output directory.
struct TestHarness {
    extractor: MockExtractor,
    transcoder: MockTranscoder,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            extractor: MockExtractor::new(),
            transcoder: MockTranscoder::new(),
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn output_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("out")
    }

    fn snapshot_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("data/jobs.json")
    }

    fn open_registry(&self) -> Arc<JobRegistry> {
        Arc::new(JobRegistry::open(Arc::new(JsonFileSnapshotStore::new(
            self.snapshot_path(),
        ))))
    }

    fn create_orchestrator(&self) -> JobOrchestrator {
        self.create_orchestrator_with(self.open_registry(), Arc::new(NoCredentials))
    }

    fn create_orchestrator_with(
        &self,
        registry: Arc<JobRegistry>,
        credentials: Arc<dyn CredentialStore>,
    ) -> JobOrchestrator {
        JobOrchestrator::new(
            registry,
            Arc::new(StrategyResolver::new(&ExtractorConfig::default(), credentials)),
            Arc::new(self.extractor.clone()),
            Arc::new(self.transcoder.clone()),
            self.output_dir(),
        )
    }

    async fn wait_for_terminal(&self, orchestrator: &JobOrchestrator, job_id: &str) -> Job {
        let start = std::time::Instant::now();
        loop {
            let job = orchestrator.status(job_id).expect("job should exist");
            if job.status.is_terminal() {
                return job;
            }
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "job {} did not finish, last status {}",
                job_id,
                job.status
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

#[tokio::test]
async fn test_full_job_produces_renamed_files() {
    let harness = TestHarness::new();
    let orchestrator = harness.create_orchestrator();

    let outcome = assert_ok!(orchestrator.submit("https://www.bilibili.com/video/BV1xx", true, true));
    let job = harness
        .wait_for_terminal(&orchestrator, &outcome.job_id)
        .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.result.len(), 2);

    for (kind, file) in &job.result {
        assert!(file.file_name.starts_with(kind.as_str()));
        assert!(file.file_name.contains("Test_Clip"));
        assert!(harness.output_dir().join(&file.file_name).exists());
    }

    // Only the published files remain in the output directory.
    let names: HashSet<String> = std::fs::read_dir(harness.output_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    let published: HashSet<String> = job.result.values().map(|f| f.file_name.clone()).collect();
    assert_eq!(names, published);
}

#[tokio::test]
async fn test_audio_failure_is_rescued_by_transcoding() {
    let harness = TestHarness::new();
    harness
        .extractor
        .set_default_behavior(AssetKind::Audio, MockBehavior::Fail("HTTP Error 403".into()))
        .await;
    let orchestrator = harness.create_orchestrator();

    let id = orchestrator
        .submit("https://www.youtube.com/watch?v=x", true, true)
        .unwrap()
        .job_id;
    let job = harness.wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.result.contains_key(&AssetKind::Audio));
    assert!(job.result[&AssetKind::Audio].file_name.ends_with(".mp3"));
    assert_eq!(harness.transcoder.calls().await.len(), 1);
}

#[tokio::test]
async fn test_total_failure_reports_every_cause() {
    let harness = TestHarness::new();
    harness
        .extractor
        .set_default_behavior(AssetKind::Video, MockBehavior::Fail("video blocked".into()))
        .await;
    harness
        .extractor
        .set_default_behavior(AssetKind::Audio, MockBehavior::Fail("audio blocked".into()))
        .await;
    let orchestrator = harness.create_orchestrator();

    let id = orchestrator
        .submit("https://www.douyin.com/video/1", true, true)
        .unwrap()
        .job_id;
    let job = harness.wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.unwrap();
    assert!(error.contains("video blocked"));
    assert!(error.contains("audio blocked"));
    assert!(job.result.is_empty());
}

#[tokio::test]
async fn test_jobs_run_independently() {
    let harness = TestHarness::new();
    harness.extractor.set_delay(Duration::from_millis(30)).await;
    let orchestrator = harness.create_orchestrator();

    let ids: Vec<String> = (0..4)
        .map(|i| {
            orchestrator
                .submit(&format!("https://example.com/watch/{}", i), i % 2 == 0, true)
                .unwrap()
                .job_id
        })
        .collect();

    assert_eq!(orchestrator.list().in_flight_urls, 4);

    for id in &ids {
        let job = harness.wait_for_terminal(&orchestrator, id).await;
        assert_eq!(job.status, JobStatus::Completed);
    }

    let listing = orchestrator.list();
    assert_eq!(listing.total_jobs, 4);
    assert_eq!(listing.in_flight_urls, 0);
}

#[tokio::test]
async fn test_credentials_reach_the_extractor() {
    let harness = TestHarness::new();
    let credentials =
        StaticCredentialStore::new().with_cookies(Platform::Youtube, "/cookies/youtube.txt");
    let orchestrator =
        harness.create_orchestrator_with(harness.open_registry(), Arc::new(credentials));

    let id = orchestrator
        .submit("https://youtu.be/abc", false, true)
        .unwrap()
        .job_id;
    harness.wait_for_terminal(&orchestrator, &id).await;

    let downloads = harness.extractor.downloads().await;
    assert!(!downloads.is_empty());
    for download in downloads {
        assert_eq!(
            download.profile.credentials.unwrap().cookies_file,
            std::path::PathBuf::from("/cookies/youtube.txt")
        );
    }
}

#[tokio::test]
async fn test_rejected_submissions_create_nothing() {
    let harness = TestHarness::new();
    let orchestrator = harness.create_orchestrator();

    assert_err!(orchestrator.submit("https://example.com/watch/1", false, false));
    assert_err!(orchestrator.submit("ftp://example.com/file", true, true));
    assert_err!(orchestrator.submit("", true, true));

    assert_eq!(orchestrator.list().total_jobs, 0);
    assert!(harness.extractor.info_calls().await.is_empty());
}

#[tokio::test]
async fn test_restart_fails_interrupted_jobs() {
    let harness = TestHarness::new();
    harness.extractor.set_delay(Duration::from_secs(30)).await;

    let id = {
        let orchestrator = harness.create_orchestrator();
        let id = orchestrator
            .submit("https://example.com/watch/slow", true, true)
            .unwrap()
            .job_id;
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.shutdown();
        id
    };

    let orchestrator = harness.create_orchestrator();
    let job = orchestrator.status(&id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("interrupted by service restart"));
    assert_eq!(orchestrator.list().in_flight_urls, 0);
}

#[tokio::test]
async fn test_completed_jobs_survive_restart() {
    let harness = TestHarness::new();

    let id = {
        let orchestrator = harness.create_orchestrator();
        let id = orchestrator
            .submit("https://example.com/watch/1", true, false)
            .unwrap()
            .job_id;
        harness.wait_for_terminal(&orchestrator, &id).await;
        id
    };

    let orchestrator = harness.create_orchestrator();
    let job = orchestrator.status(&id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.len(), 1);
}

#[tokio::test]
async fn test_retention_spares_recent_job_output() {
    let harness = TestHarness::new();
    let orchestrator = harness.create_orchestrator();

    let id = orchestrator
        .submit("https://example.com/watch/1", true, true)
        .unwrap()
        .job_id;
    harness.wait_for_terminal(&orchestrator, &id).await;

    let config = RetentionConfig {
        file_retention_hours: 24,
        ..Default::default()
    };
    let manager = RetentionManager::new(harness.output_dir(), &config);
    match manager.run_pass().await.unwrap() {
        CleanupOutcome::Completed(stats) => {
            assert_eq!(stats.total_files, 2);
            assert_eq!(stats.deleted_files, 0);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let info = manager.storage_info().await.unwrap();
    assert_eq!(info.total_files, 2);
}
