pub mod api;
pub mod dtos;
pub mod error;
pub mod extractors;
pub mod relay;
pub mod services;

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Context;
use axum::{Extension, Router, routing::get};
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::server::api::{VodProxyController, health_controller::health_endpoint};
use crate::server::services::RelayServices;

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_uptime_seconds() -> u64 {
    START_TIME.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct RelayApplicationServer;

impl RelayApplicationServer {
    pub fn router(services: RelayServices) -> Router {
        let limit = services.config.max_concurrent_relays.max(1);

        Router::new()
            .nest(
                "/api/proxy/vod",
                VodProxyController::app().layer(GlobalConcurrencyLimitLayer::new(limit)),
            )
            .route("/health", get(health_endpoint))
            .layer(Extension(services))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(services: RelayServices) -> anyhow::Result<()> {
        Lazy::force(&START_TIME);

        let addr = SocketAddr::from(([0, 0, 0, 0], services.config.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("relay listening on {}", addr);

        axum::serve(listener, Self::router(services))
            .await
            .context("relay server exited")?;

        Ok(())
    }
}
