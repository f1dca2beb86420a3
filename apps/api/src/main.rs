//! # hisaab API Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiConfig::load()  ─►  Database::new() + migrations  ─►  AppState     │
//! │                                                             │           │
//! │  TcpListener (HOST:PORT)  ◄─  build_router(state)  ◄────────┘           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  serve until Ctrl-C / SIGTERM  ─►  drain  ─►  close database pool      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hisaab_api::{build_router, ApiConfig, AppState};
use hisaab_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hisaab=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting hisaab API server...");

    // Load configuration
    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        addr = %config.bind_address(),
        db = %config.database_path.display(),
        stock_policy = ?config.stock_policy(),
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    // Open database (runs migrations)
    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;

    let addr = config.bind_address();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
