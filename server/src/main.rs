//! walletd Server Binary
//!
//! Wires the Postgres store, balance cache, ledger service, and REST
//! surface into a single process.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use walletd_ledger::{LruBalanceCache, PgLedgerStore, WalletService};
use walletd_server::rest::{self, AppState};
use walletd_server::{Metrics, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting walletd");

    // Load configuration
    let config = ServerConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let store = PgLedgerStore::connect(&config.database_url, config.db_pool_size).await?;
    store.migrate().await?;

    let cache = LruBalanceCache::new(config.cache_capacity);
    let service = Arc::new(WalletService::new(store, cache));
    let metrics = Arc::new(Metrics::new());

    let state = AppState::new(service, metrics);
    let app = rest::router(state, config.metrics_enabled);

    let addr = format!("{}:{}", config.listen_addr, config.listen_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "walletd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("walletd shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    info!("Shutdown signal received");
}
