// Corporate Registry - Web Server
// Imports corp.xml on first start, then serves the search API

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use corp_registry::{
    build_router, init_logging, load_if_empty, AppState, CorporationService, ServerConfig,
    SqliteStore, StoreConfig,
};

/// Command-line arguments for the registry server
#[derive(Parser, Debug)]
#[command(name = "corp-registry-server")]
#[command(about = "Corporate registry search API")]
#[command(version)]
struct Args {
    #[command(flatten)]
    store: StoreConfig,

    #[command(flatten)]
    server: ServerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    info!("Corporate Registry server v{}", corp_registry::VERSION);

    // Open database
    let store = SqliteStore::open(&args.store.database)?;
    info!("Database opened: {}", args.store.database.display());

    // One-time import, before any request is accepted
    let outcome = load_if_empty(&store, &args.store.source)?;
    info!("Startup import: {}", outcome);

    let state = AppState::new(CorporationService::new(Arc::new(store)));
    let app = build_router(state, &args.server.web_dir);

    let addr = args.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("API: http://{}/api/corporations/search?q=", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
