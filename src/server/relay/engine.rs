use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::task::JoinHandle;

use super::{OutboundSink, RelayOutcome, RelaySession, UpstreamStream, Variant};
use crate::telemetry;

pub struct RelayEngine;

impl RelayEngine {
    /// starts a session on its own task and returns the response it feeds. headers go out with
    /// the response head, before the first body byte.
    pub fn relay(upstream: UpstreamStream, variant: Variant, headers: HeaderMap) -> Response {
        let (sink, body) = OutboundSink::with_body();
        Self::spawn_session(variant, upstream, sink);

        (StatusCode::OK, headers, body).into_response()
    }

    pub fn spawn_session(
        variant: Variant,
        upstream: UpstreamStream,
        sink: OutboundSink,
    ) -> JoinHandle<RelayOutcome> {
        tokio::spawn(async move {
            let outcome = RelaySession::new(variant, upstream, sink).run().await;
            telemetry::record_session(variant, &outcome);
            outcome
        })
    }
}
