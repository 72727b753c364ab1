use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsdb_admin::{create_router, AdminConfig, AdminMetrics, AppState};
use tsdb_core::{EngineHandle, MemoryEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Arc::new(AdminConfig::load()?);
    info!("Loaded configuration: {:?}", config);

    let metrics = AdminMetrics::new().context("Failed to register metrics")?;

    // The handle starts empty; requests report "not ready" until the engine is attached
    let engine = EngineHandle::new();
    let state = AppState::new(config.clone(), engine.clone(), metrics);

    let memory_engine = MemoryEngine::open(&config.storage.data_dir)
        .with_context(|| format!("Failed to open engine at {}", config.storage.data_dir.display()))?;
    engine.set(Arc::new(memory_engine));
    info!("Storage engine ready");

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    let addr = listener.local_addr()?;
    info!("TSDB Admin Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("TSDB Admin Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
