use neo_backend::config;
use neo_backend::model::feed::FileRawStore;
use neo_backend::service::{self, AppState};

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::read_config(config::CONFIG_PATH)?;

    // Initialize logging
    let _logging_guard =
        neo_backend::logging::init_logging(&config.log_dir, "neo-backend", &config.log_level)?;

    tracing::info!("NEO backend starting...");
    if !Path::new(config::CONFIG_PATH).exists() {
        tracing::warn!("{} not found, using default configuration", config::CONFIG_PATH);
    }

    let store = FileRawStore::open(config.raw_store_path()).await?;
    tracing::info!("Raw payload store: {:?}", store.path());
    tracing::info!(
        "Store policy: {}",
        if config.clear_before_fetch {
            "clear before each fetch"
        } else {
            "append only"
        }
    );

    let state = AppState::from_config(config, Arc::new(store))?;
    let app = service::router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    tracing::info!("HTTP server listening on {}", config.server_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("NEO backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
