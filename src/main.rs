use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::info;

use vod_relay::{AppConfig, Logger, RelayApplicationServer, server::services::RelayServices, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards have to live as long as main or buffered logs get lost
    let _guards = Logger::init(config.cargo_env, &config.log_dir, config.sentry_dsn.clone());

    info!("logger and env prepped...");

    if let Some(port) = config.metrics_port {
        telemetry::install_exporter(port)?;
    }

    let services = RelayServices::from_config(config.clone())
        .await
        .context("failed to build relay services")?;

    RelayApplicationServer::serve(services)
        .await
        .context("relay server failed to start")?;

    Ok(())
}
