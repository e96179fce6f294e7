use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{debug, error};

use crate::server::{
    error::{AppResult, Error},
    extractors::{RelayParams, RelayRequest},
    relay::{self, RelayEngine, Variant},
    services::{FetchError, GateDecision, RelayServices},
};
use crate::telemetry;

pub struct VodProxyController;

impl VodProxyController {
    pub fn app() -> Router {
        Router::new()
            .route("/key", get(Self::proxy_key).options(Self::proxy_options))
            .route(
                "/segment",
                get(Self::proxy_segment).options(Self::proxy_options),
            )
    }

    async fn proxy_key(RelayParams(request, services): RelayParams) -> Response {
        Self::respond(Variant::Key, request, services).await
    }

    async fn proxy_segment(RelayParams(request, services): RelayParams) -> Response {
        Self::respond(Variant::Segment, request, services).await
    }

    // preflight for players that send Range
    async fn proxy_options() -> impl IntoResponse {
        (StatusCode::NO_CONTENT, relay::cors_headers())
    }

    async fn respond(variant: Variant, request: RelayRequest, services: RelayServices) -> Response {
        let response = Self::relay(variant, request, services)
            .await
            .unwrap_or_else(IntoResponse::into_response);

        telemetry::record_request(variant, response.status().as_u16());
        response
    }

    /// gate -> origin -> headers -> relay. everything up to the relay can still turn into a json
    /// error, after that the status is already committed
    pub async fn relay(
        variant: Variant,
        request: RelayRequest,
        services: RelayServices,
    ) -> AppResult<Response> {
        if let GateDecision::Rejected(rejection) =
            services.gate.authorize(&request.source_key).await?
        {
            debug!("rejected {} for {}: {:?}", variant, request.source_key, rejection);
            return Err(rejection.into());
        }

        let open = services
            .origin
            .fetch(&request.origin_url)
            .await
            .map_err(|e| match e {
                FetchError::InvalidUrl(detail) => {
                    debug!("invalid origin url {}: {}", request.origin_url, detail);
                    Error::InvalidUrl
                }
                FetchError::UpstreamUnavailable { status, detail } => {
                    error!(
                        "source {}: {} fetch failed (origin status {:?}): {}",
                        request.source_key, variant, status, detail
                    );
                    Error::UpstreamUnavailable(variant)
                }
            })?;

        debug!("origin answered {} for {}", open.status, variant);

        let headers = relay::translate(&open.headers, variant);
        Ok(RelayEngine::relay(open.body, variant, headers))
    }
}
