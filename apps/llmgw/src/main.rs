mod bootstrap;
mod cli;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::bootstrap::bootstrap;
use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llmgw=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let boot = bootstrap(args).await?;

    let gateway_app = llmgw_gateway::router(boot.gateway_state.clone(), boot.authenticator.clone())
        .route("/health", get(health));
    let control_app = Router::new()
        .merge(llmgw_control::router(boot.control_state.clone()))
        .nest("/sso", llmgw_auth::sso_router(boot.sso_handler.clone()))
        .route("/health", get(health));

    let gateway_listener = tokio::net::TcpListener::bind(&boot.config.data_plane_addr)
        .await
        .with_context(|| format!("bind data plane address {}", boot.config.data_plane_addr))?;
    let control_listener = tokio::net::TcpListener::bind(&boot.config.control_plane_addr)
        .await
        .with_context(|| format!("bind control plane address {}", boot.config.control_plane_addr))?;

    info!(addr = %boot.config.data_plane_addr, "data plane listening");
    info!(addr = %boot.config.control_plane_addr, "control plane listening");

    let shutdown = CancellationToken::new();

    let gateway_shutdown = shutdown.clone();
    let gateway_server = tokio::spawn(async move {
        axum::serve(gateway_listener, gateway_app)
            .with_graceful_shutdown(async move { gateway_shutdown.cancelled().await })
            .await
    });
    let control_shutdown = shutdown.clone();
    let control_server = tokio::spawn(async move {
        axum::serve(control_listener, control_app)
            .with_graceful_shutdown(async move { control_shutdown.cancelled().await })
            .await
    });

    tokio::signal::ctrl_c().await.context("listen for ctrl-c")?;
    info!("shutdown signal received, draining connections");
    shutdown.cancel();

    gateway_server.await.context("join data plane server")??;
    control_server.await.context("join control plane server")??;

    boot.usage_shutdown.cancel();
    boot.usage_persister.await.context("join usage persister")?;
    boot.session_cleanup.abort();

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
