//! Animals API
//!
//! REST service over the `animals` table of a managed Supabase datastore.
//! The process keeps no state of its own; every request goes to the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

mod api;
mod config;
mod domain;
mod error;
mod logging;
mod storage;

use crate::api::build_router;
use crate::config::{Backend, Config};
use crate::storage::{AnimalStore, SqliteStore, SupabaseStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Datastore handle, built once at startup.
    pub store: Arc<dyn AnimalStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        // Missing .env is expected in production
        eprintln!("Note: No .env file loaded ({e})");
    }

    // Initialize logging
    logging::init();

    tracing::info!("Starting Animals API v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        backend = %config.database.backend,
        table = %config.database.table,
        "Configuration loaded"
    );

    // Connect to the datastore
    let store = connect_store(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize datastore");
        anyhow::anyhow!("Datastore error: {}", e)
    })?;

    tracing::info!(backend = store.backend(), "Datastore ready");

    // Build router
    let app = build_router(AppState { store });

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn connect_store(config: &Config) -> error::StoreResult<Arc<dyn AnimalStore>> {
    let db = &config.database;

    let store: Arc<dyn AnimalStore> = match db.backend {
        Backend::Supabase => Arc::new(SupabaseStore::new(
            &db.supabase_url,
            db.supabase_key.clone(),
            &db.table,
            Duration::from_secs(db.timeout_secs),
        )?),
        Backend::Sqlite => Arc::new(SqliteStore::connect(&db.sqlite_url, &db.table).await?),
    };

    if let Err(e) = store.ping().await {
        // Not fatal: each request reports its own datastore errors.
        tracing::warn!(error = %e, "Datastore not reachable at startup");
    }

    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
