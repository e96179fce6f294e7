use axum::Extension;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use tracing::debug;

use crate::server::error::Error;
use crate::server::services::RelayServices;

#[derive(Deserialize)]
struct RelayQuery {
    url: Option<String>,
    source: Option<String>,
}

/// `url` and `source` as they came in. `url` has been through axum's query decoding once,
/// the origin fetcher decodes it again before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub origin_url: String,
    pub source_key: String,
}

pub struct RelayParams(pub RelayRequest, pub RelayServices);

/// both params are required, `url` is checked first. an empty value counts as missing
impl<S> FromRequestParts<S> for RelayParams
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(services): Extension<RelayServices> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|err| Error::InternalServerErrorWithContext(err.to_string()))?;

        // a malformed query string is treated the same as one with nothing in it
        let Query(query): Query<RelayQuery> = Query::from_request_parts(parts, state)
            .await
            .unwrap_or(Query(RelayQuery {
                url: None,
                source: None,
            }));

        let origin_url = query
            .url
            .filter(|url| !url.is_empty())
            .ok_or(Error::MissingParameter("url"))?;

        let source_key = query
            .source
            .filter(|source| !source.is_empty())
            .ok_or(Error::MissingParameter("source"))?;

        debug!("relay request for source {}: {}", source_key, origin_url);

        Ok(RelayParams(
            RelayRequest {
                origin_url,
                source_key,
            },
            services,
        ))
    }
}
