use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cherga_core::{
    create_event_channel, load_config, validate_config, Clock, Directory, QueueContext,
    ScheduleOracle, SqliteCounterStore, SqliteDirectory, SqliteTicketStore, SystemClock,
    TicketStore,
};
use cherga_server::{api::create_router, events::drain_events, state::AppState};

/// Buffer size for the queue event channel
const EVENT_BUFFER_SIZE: usize = 1000;

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
    let config_path = std::env::var("CHERGA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("System timezone: {}", config.queue.system_timezone);

    let fallback_zone = config
        .queue
        .system_zone()
        .context("Invalid system timezone")?;

    // Stores share one database file, each on its own connection
    let ticket_store: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path).context("Failed to create ticket store")?,
    );
    let counter_store = Arc::new(
        SqliteCounterStore::new(&config.database.path)
            .context("Failed to create counter store")?,
    );
    let directory: Arc<dyn Directory> = Arc::new(
        SqliteDirectory::new(&config.database.path).context("Failed to open directory")?,
    );
    info!("Stores initialized");

    // Queue events are drained by a background task
    let (event_sink, event_rx) = create_event_channel(EVENT_BUFFER_SIZE);
    let drain_handle = tokio::spawn(drain_events(event_rx));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ctx = QueueContext::new(
        ticket_store,
        directory,
        clock,
        Arc::new(event_sink),
        ScheduleOracle::new(fallback_zone),
    );

    let state = Arc::new(AppState::new(&config, ctx, counter_store));
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

    // The router (and with it every event sink clone) is gone once serve
    // returns, so the drain task sees the channel close.
    info!("Server shutting down...");
    match drain_handle.await {
        Ok(drained) => info!("Event drain stopped after {} events", drained),
        Err(e) => error!("Event drain task failed: {}", e),
    }

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
