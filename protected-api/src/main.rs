use std::sync::Arc;

use anyhow::Context;
use cognito_auth::RequestGate;
use protected_api::config::load_service_config;
use protected_api::{build_router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_service_config()?;
    let gate = RequestGate::connect(config.auth)
        .await
        .context("Failed to initialise JWT gate")?;
    let app = build_router(AppState {
        gate: Arc::new(gate),
    });

    info!(addr = %config.addr, "starting protected-api");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
