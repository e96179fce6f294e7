use axum::Extension;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::error;

use crate::logger::Logger;
use crate::server::dtos::health_dto::{
    HealthResponse, HealthStatus, ServiceHealthDetails, SourceConfigHealth,
};
use crate::server::services::RelayServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// the relay itself has no state, so healthy just means the source config can be read
pub async fn health_endpoint(
    Extension(services): Extension<RelayServices>,
) -> (StatusCode, Json<HealthResponse>) {
    let source_config = check_source_config_health(&services).await;

    let http_status = match source_config.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status: source_config.status,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: Logger::environment_name(services.config.cargo_env).to_string(),
        services: ServiceHealthDetails { source_config },
    };

    (http_status, Json(response))
}

async fn check_source_config_health(services: &RelayServices) -> SourceConfigHealth {
    let backend = services.sources.backend_name().to_string();

    match services.sources.health_check().await {
        Ok(response_time_ms) => SourceConfigHealth {
            status: HealthStatus::Healthy,
            backend,
            response_time_ms,
        },
        Err(e) => {
            error!("source config health check failed: {}", e);
            SourceConfigHealth {
                status: HealthStatus::Unhealthy,
                backend,
                response_time_ms: 0.0,
            }
        }
    }
}
