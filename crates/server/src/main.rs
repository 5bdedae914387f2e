use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crosspost_core::{
    load_config, validate_config, Extractor, GraphClient, JobRunner, JobStore, SqliteJobStore,
    UploadTransport, YtDlpExtractor,
};

use crosspost_server::api::create_router;
use crosspost_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CROSSPOST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Download directory: {:?}", config.extractor.output_dir);

    // Create SQLite job store
    let store: Arc<dyn JobStore> = Arc::new(
        SqliteJobStore::new(&config.database.path).context("Failed to create job store")?,
    );
    info!("Job store initialized");

    // Create yt-dlp extractor
    let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    match extractor.validate().await {
        Ok(()) => info!("Extractor binary verified"),
        // The server still comes up; download jobs will fail until the
        // binary is installed.
        Err(e) => warn!("Extractor validation failed: {}", e),
    }

    // Create Graph API transport
    let transport: Arc<dyn UploadTransport> =
        Arc::new(GraphClient::new(config.graph.clone()));
    if config.graph.access_token.is_empty() {
        warn!("No Graph access token configured; uploads will fail until one is set");
    }

    // Create the job runner
    let runner = Arc::new(JobRunner::new(
        config.runner.clone(),
        Arc::clone(&store),
        Arc::clone(&extractor),
        Arc::clone(&transport),
        config.upload.clone(),
    ));

    if config.runner.enabled {
        runner.start().await;
        info!("Job runner started");
    } else {
        info!("Job runner disabled in config; jobs are processed via the API");
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        extractor,
        transport,
        Arc::clone(&runner),
    ));

    // Create router
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

    // Stop the runner; in-flight chunk transfers complete first
    info!("Server shutting down...");
    runner.stop().await;
    info!("Job runner stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
