//! # Config Service API Server
//!
//! REST service managing applications and their configurations.
//!
//! ## Start-up
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Open the database pool
//! 3. Apply pending migrations
//! 4. Serve until Ctrl-C, then drain and close the pool
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p configsvc-api
//! ```

use anyhow::Context;
use configsvc_api::{
    app::{build_router, AppState},
    config::Config,
};
use configsvc_shared::db::migrations::MigrationRunner;
use configsvc_shared::db::pool::DatabaseManager;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing; RUST_LOG wins over LOG_LEVEL
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Config Service API v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    if config.api.debug {
        tracing::warn!("Debug mode enabled");
    }

    let db = Arc::new(DatabaseManager::new(config.database.clone()));
    db.initialize()
        .await
        .context("Failed to initialize database pool")?;

    let migrations = MigrationRunner::new(Arc::clone(&db), config.migrations_dir.clone());
    if let Err(e) = migrations.run_all().await {
        db.close().await;
        return Err(e).context("Failed to run database migrations");
    }

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(Arc::clone(&db), config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Server listening on http://{}", bind_address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    db.close().await;
    tracing::info!("Shutdown complete");

    served.context("Server error")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections..."),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
