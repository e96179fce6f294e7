//! Prometheus counters for the relay.
//!
//! Everything goes through the `metrics` facade, so when no exporter is
//! installed (tests, or no `METRICS_PORT`) the calls are no-ops.

use std::net::SocketAddr;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::server::relay::{RelayOutcome, Variant};

pub const REQUESTS_TOTAL: &str = "vod_relay_requests_total";
pub const SESSIONS_TOTAL: &str = "vod_relay_sessions_total";
pub const BYTES_TOTAL: &str = "vod_relay_bytes_total";

pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install prometheus exporter")?;

    info!("prometheus exporter listening on {}", addr);
    Ok(())
}

pub fn record_request(variant: Variant, status: u16) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "variant" => variant.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_session(variant: Variant, outcome: &RelayOutcome) {
    metrics::counter!(
        SESSIONS_TOTAL,
        "variant" => variant.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    metrics::counter!(BYTES_TOTAL, "variant" => variant.as_str()).increment(outcome.bytes());
}
