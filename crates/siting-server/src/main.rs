//! Siting Server - HTTP backend for hydrogen storage siting analysis

use anyhow::Result;
use siting_server::config::Config;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("siting_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting Siting Server...");

    let config = Config::from_env();
    let port = config.server_port;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        projection = %config.rules.planar_proj,
        "Loaded configuration"
    );
    // Fail at startup rather than on the first request
    config.rules.projection()?;

    let app = siting_server::app(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
