use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::server::dtos::error_dto::ErrorResponse;
use crate::server::relay::Variant;

pub type AppResult<T> = Result<T, Error>;

/// everything that can go wrong before the first body byte is sent. once a relay is streaming
/// errors can't become one of these anymore, see `RelayOutcome::Aborted`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Missing {0}")]
    MissingParameter(&'static str),

    #[error("Source not found")]
    SourceNotFound,

    #[error("Proxy mode not enabled for this source")]
    ProxyDisabled,

    #[error("Invalid url")]
    InvalidUrl,

    // never carries the origin's status or body, those only go to the logs
    #[error("Failed to fetch {0}")]
    UpstreamUnavailable(Variant),

    #[error("Internal server error")]
    InternalServerError,

    #[error("Internal server error: {0}")]
    InternalServerErrorWithContext(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidUrl => StatusCode::BAD_REQUEST,
            Self::SourceNotFound => StatusCode::NOT_FOUND,
            Self::ProxyDisabled => StatusCode::FORBIDDEN,
            Self::UpstreamUnavailable(_)
            | Self::InternalServerError
            | Self::InternalServerErrorWithContext(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::InternalServerErrorWithContext(context) => {
                error!("internal error: {}", context);
                Self::InternalServerError.to_string()
            }
            other => other.to_string(),
        };

        (self.status_code(), Json(ErrorResponse { error: message })).into_response()
    }
}
