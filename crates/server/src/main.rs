use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payflow_core::{
    load_config, validate_config, HttpInvoker, Invoker, QueueService, RecordStore,
    SqliteQueueService, SqliteRecordStore, SqliteStagingStore, StagingStore,
};
use payflow_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
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
    let config_path = std::env::var("PAYFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).context("Failed to encode config")?;
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));

    info!(
        "payflow {} starting (config {})",
        VERSION,
        &config_hash[..16]
    );
    info!(
        "Serving country {} with prefix {} ({} doc types)",
        config.pipeline.country_code,
        config.pipeline.prefix,
        config.doc_types.len()
    );
    info!("Database path: {:?}", config.database.path);
    if config.pipeline.not_accepted_statuses.is_empty() {
        warn!("No not-accepted statuses configured; INSERT dispatch is never blocked");
    }

    // Operational records, queues and staged payments share one database
    let records: Arc<dyn RecordStore> = Arc::new(
        SqliteRecordStore::new(&config.database.path).context("Failed to create record store")?,
    );
    info!("Record store initialized");

    let queues: Arc<dyn QueueService> = Arc::new(
        SqliteQueueService::new(&config.database.path, &config.queue)
            .context("Failed to create queue service")?,
    );
    info!("Queue service initialized (base url {})", config.queue.base_url);

    let staging: Arc<dyn StagingStore> = Arc::new(
        SqliteStagingStore::new(&config.database.path)
            .context("Failed to create staging store")?,
    );
    info!("Staging store initialized");

    let invoker: Arc<dyn Invoker> =
        Arc::new(HttpInvoker::new(&config.invoker).context("Failed to create invoker")?);
    info!(
        "Downstream invoker initialized (timeout {}s)",
        config.invoker.timeout_secs
    );

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        records,
        queues,
        invoker,
        staging,
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

    info!("Server shut down");
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
