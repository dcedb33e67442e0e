use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediagrab_core::{
    load_config, load_config_from_env, validate_config, Config, CookieDirStore, FfmpegTranscoder,
    JobOrchestrator, JobRegistry, JsonFileSnapshotStore, RetentionManager, StrategyResolver,
    YtDlpExtractor,
};

use mediagrab_server::api::create_router;
use mediagrab_server::state::AppState;

/// Config file used when `MEDIAGRAB_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let json = std::env::var("MEDIAGRAB_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn load() -> Result<Config> {
    let explicit = std::env::var("MEDIAGRAB_CONFIG").ok().map(PathBuf::from);
    let config = match explicit {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None if PathBuf::from(DEFAULT_CONFIG_PATH).exists() => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => {
            info!("No config file, using defaults and environment");
            load_config_from_env().context("Failed to load config from environment")?
        }
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run() -> Result<()> {
    init_tracing();

    let config = load()?;
    info!("Configuration loaded successfully");
    info!("Output directory: {:?}", config.storage.output_dir);
    info!("Job snapshot: {:?}", config.storage.snapshot_path);

    std::fs::create_dir_all(&config.storage.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {:?}",
            config.storage.output_dir
        )
    })?;

    // Job registry, restored from the last snapshot
    let registry = Arc::new(JobRegistry::open(Arc::new(JsonFileSnapshotStore::new(
        &config.storage.snapshot_path,
    ))));
    info!(jobs = registry.len(), "Job registry loaded");

    // External tools
    let credentials = Arc::new(CookieDirStore::new(&config.extractor.cookies_dir));
    let resolver = Arc::new(StrategyResolver::new(&config.extractor, credentials));
    let extractor = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    if config.extractor.proxy().is_some() {
        info!("Extractor proxy configured");
    }

    let orchestrator = Arc::new(JobOrchestrator::new(
        registry,
        resolver,
        extractor,
        transcoder,
        config.storage.output_dir.clone(),
    ));

    // Retention loop
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let retention = RetentionManager::new(&config.storage.output_dir, &config.retention);
    let retention_handle = if retention.is_enabled() {
        let manager = retention.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        info!(
            interval_secs = config.retention.check_interval_secs,
            retention_hours = config.retention.file_retention_hours,
            max_storage_mb = config.retention.max_storage_mb,
            "Retention manager started"
        );
        Some(tokio::spawn(manager.run_loop(shutdown_rx)))
    } else {
        info!("Retention disabled in config");
        None
    };

    // Create app state and router
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        retention,
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    let _ = shutdown_tx.send(());
    if let Some(handle) = retention_handle {
        let _ = handle.await;
        info!("Retention manager stopped");
    }

    orchestrator.shutdown();
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
