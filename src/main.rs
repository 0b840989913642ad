use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use encyclopedia_rag::core::config::{AppPaths, ConfigService};
use encyclopedia_rag::core::logging;
use encyclopedia_rag::server::router::router;
use encyclopedia_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let config = ConfigService::new(paths.clone());
    let settings = config.load_settings().with_context(|| {
        format!(
            "Invalid configuration (config: {}, secrets: {})",
            paths.config_path.display(),
            paths.secrets_path.display()
        )
    })?;
    let state = AppState::initialize(&settings)?;

    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
