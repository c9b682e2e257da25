use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use firmware_server::config::AppConfig;
use firmware_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    info!(
        firmware_dir = %config.storage.firmware_dir.display(),
        stats_path = %config.storage.stats_path.display(),
        max_artifact_size = config.storage.max_artifact_size,
        "Opening firmware storage"
    );
    let state = AppState::new(config.clone())
        .await
        .context("Failed to open firmware storage")?;

    let app = firmware_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    info!(url = %config.firmware_url(), "Devices fetch OTA updates from");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
