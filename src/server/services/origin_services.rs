use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode, header};
use tracing::{debug, error};
use url::Url;

use crate::server::relay::{ReqwestByteSource, UpstreamStream};

pub type DynOriginFetcher = Arc<dyn OriginFetcherTrait + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid origin url: {0}")]
    InvalidUrl(String),

    /// non 2xx, or the request never got a response head. `status` is the origin's real status
    /// when there was one, it only ever gets logged
    #[error("origin unavailable ({detail})")]
    UpstreamUnavailable {
        status: Option<StatusCode>,
        detail: String,
    },
}

/// a successful origin response. whoever holds this owns the connection through `body`
pub struct OpenStream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamStream,
}

impl std::fmt::Debug for OpenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
pub trait OriginFetcherTrait {
    async fn fetch(&self, origin_url: &str) -> Result<OpenStream, FetchError>;
}

/// decodes the `url` param one more time (players double encode more often than you'd think)
/// and makes sure it's an absolute http(s) url
pub fn parse_origin_url(raw: &str) -> Result<Url, FetchError> {
    let decoded = urlencoding::decode(raw)
        .map_err(|e| FetchError::InvalidUrl(format!("bad percent encoding: {}", e)))?;

    let url = Url::parse(&decoded).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl("missing host".to_string()));
    }

    Ok(url)
}

pub struct OriginFetcher {
    http: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl OriginFetcher {
    pub fn new(user_agent: String, timeout: Duration) -> Self {
        // no client wide timeout, that would also cap the body and kill long segments
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                error!("failed to build origin client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            user_agent,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl OriginFetcherTrait for OriginFetcher {
    async fn fetch(&self, origin_url: &str) -> Result<OpenStream, FetchError> {
        let url = parse_origin_url(origin_url)?;

        // a lot of origins refuse hotlinks, using the url itself as referer gets past most of them
        let request = self
            .http
            .get(url.clone())
            .header(header::USER_AGENT, &self.user_agent)
            .header(header::REFERER, url.as_str());

        debug!("fetching origin {}", url);

        let response = match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(FetchError::UpstreamUnavailable {
                    status: None,
                    detail: e.to_string(),
                });
            }
            Err(_) => {
                return Err(FetchError::UpstreamUnavailable {
                    status: None,
                    detail: format!("no response within {:?}", self.timeout),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            // drop before returning so the connection isn't held while the error goes out
            drop(response);
            return Err(FetchError::UpstreamUnavailable {
                status: Some(status),
                detail: format!("origin returned {}", status),
            });
        }

        let headers = response.headers().clone();

        Ok(OpenStream {
            status,
            headers,
            body: UpstreamStream::new(ReqwestByteSource::new(response)),
        })
    }
}
