use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use vod_relay::{
    AppConfig, RelayApplicationServer,
    database::{AdminConfig, SourceEntry, StaticSourcePolicyRepository},
    server::{
        dtos::error_dto::ErrorResponse,
        services::{
            DynOriginFetcher, FetchError, OpenStream, OriginFetcher, OriginFetcherTrait,
            RelayServices,
        },
    },
};

const TEST_UA: &str = "relay-test-agent/1.0";

fn big_payload() -> Vec<u8> {
    (0..1_048_576u32).map(|i| (i % 251) as u8).collect()
}

/// a tiny origin on a random local port
async fn start_origin() -> SocketAddr {
    let app = Router::new()
        .route(
            "/seg.ts",
            get(|| async { ([(header::CONTENT_TYPE, "video/mp2t")], "0123456789") }),
        )
        .route(
            "/key.bin",
            // no content type on purpose
            get(|| async { Response::new(Body::from("0123456789abcdef")) }),
        )
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/echo-headers",
            get(|headers: HeaderMap| async move {
                let value = |name: header::HeaderName| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string()
                };
                format!("{}|{}", value(header::USER_AGENT), value(header::REFERER))
            }),
        )
        .route("/big.ts", get(|| async { big_payload().into_response() }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn sources() -> AdminConfig {
    let entry = |key: &str, proxy_mode: bool| SourceEntry {
        key: key.to_string(),
        name: None,
        api: None,
        proxy_mode,
        disabled: false,
    };
    AdminConfig {
        source_config: vec![entry("foo", true), entry("bar", false)],
    }
}

fn app_with(origin: DynOriginFetcher) -> Router {
    let services = RelayServices::new(
        Arc::new(AppConfig::default()),
        Arc::new(StaticSourcePolicyRepository::new(sources())),
        origin,
    );
    RelayApplicationServer::router(services)
}

fn app() -> Router {
    app_with(Arc::new(OriginFetcher::new(
        TEST_UA.to_string(),
        Duration::from_secs(10),
    )))
}

/// never reaches the network, just counts how often it was asked to
#[derive(Default)]
struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl OriginFetcherTrait for CountingFetcher {
    async fn fetch(&self, _origin_url: &str) -> Result<OpenStream, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::UpstreamUnavailable {
            status: None,
            detail: "counting fetcher".to_string(),
        })
    }
}

fn relay_uri(variant: &str, url: Option<&str>, source: Option<&str>) -> String {
    let mut params = Vec::new();
    if let Some(url) = url {
        params.push(format!("url={}", urlencoding::encode(url)));
    }
    if let Some(source) = source {
        params.push(format!("source={}", source));
    }
    format!("/api/proxy/vod/{}?{}", variant, params.join("&"))
}

async fn send(app: Router, method: &str, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn get_uri(app: Router, uri: &str) -> Response {
    send(app, "GET", uri).await
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn error_body(response: Response) -> String {
    let bytes = body_bytes(response).await;
    serde_json::from_slice::<ErrorResponse>(&bytes).unwrap().error
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn relay_a_segment_with_translated_headers() {
    let origin = start_origin().await;
    let url = format!("http://{}/seg.ts", origin);

    let response = get_uri(app(), &relay_uri("segment", Some(&url), Some("foo"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("video/mp2t"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("10"));
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some("*")
    );
    assert_eq!(body_bytes(response).await, b"0123456789");
}

#[tokio::test]
async fn relay_a_key_with_the_default_content_type() {
    let origin = start_origin().await;
    let url = format!("http://{}/key.bin", origin);

    let response = get_uri(app(), &relay_uri("key", Some(&url), Some("foo"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        Some("application/octet-stream")
    );
    assert!(response.headers().get(header::ACCEPT_RANGES).is_none());
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_EXPOSE_HEADERS),
        Some("Content-Length, Content-Range")
    );
    assert_eq!(body_bytes(response).await, b"0123456789abcdef");
}

#[tokio::test]
async fn relay_a_large_body_byte_for_byte() {
    let origin = start_origin().await;
    let url = format!("http://{}/big.ts", origin);

    let response = get_uri(app(), &relay_uri("segment", Some(&url), Some("foo"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, big_payload());
}

#[tokio::test]
async fn send_browser_headers_to_the_origin() {
    let origin = start_origin().await;
    let url = format!("http://{}/echo-headers", origin);

    let response = get_uri(app(), &relay_uri("key", Some(&url), Some("foo"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let echoed = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(echoed, format!("{}|{}", TEST_UA, url));
}

#[tokio::test]
async fn return_a_generic_500_when_the_origin_fails() {
    let origin = start_origin().await;
    let url = format!("http://{}/missing", origin);

    let response = get_uri(app(), &relay_uri("segment", Some(&url), Some("foo"))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        Some("application/json")
    );
    assert_eq!(error_body(response).await, "Failed to fetch segment");

    let response = get_uri(app(), &relay_uri("key", Some(&url), Some("foo"))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(response).await, "Failed to fetch key");
}

#[tokio::test]
async fn return_a_generic_500_when_the_origin_is_unreachable() {
    // grab a free port and close it again so nothing is listening there
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{}/seg.ts", addr);
    let response = get_uri(app(), &relay_uri("segment", Some(&url), Some("foo"))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(response).await, "Failed to fetch segment");
}

#[tokio::test]
async fn reject_missing_parameters_before_fetching() {
    let fetcher = Arc::new(CountingFetcher::default());

    for variant in ["key", "segment"] {
        let response = get_uri(
            app_with(fetcher.clone()),
            &relay_uri(variant, None, Some("foo")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await, "Missing url");

        let response = get_uri(
            app_with(fetcher.clone()),
            &relay_uri(variant, Some("https://origin/seg.ts"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await, "Missing source");

        let response = get_uri(
            app_with(fetcher.clone()),
            &format!("/api/proxy/vod/{}?url=&source=", variant),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reject_unknown_sources_with_404() {
    let fetcher = Arc::new(CountingFetcher::default());

    let response = get_uri(
        app_with(fetcher.clone()),
        &relay_uri("segment", Some("https://origin/seg.ts"), Some("nope")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(response).await, "Source not found");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reject_disabled_sources_with_403_whatever_the_url() {
    let fetcher = Arc::new(CountingFetcher::default());

    for url in ["https://origin/seg.ts", "definitely not a url"] {
        let response = get_uri(
            app_with(fetcher.clone()),
            &relay_uri("key", Some(url), Some("bar")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            error_body(response).await,
            "Proxy mode not enabled for this source"
        );
    }

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reject_malformed_origin_urls() {
    for url in ["not a url", "ftp://origin/seg.ts", "/relative/seg.ts"] {
        let response = get_uri(app(), &relay_uri("segment", Some(url), Some("foo"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", url);
        assert_eq!(error_body(response).await, "Invalid url");
    }
}

#[tokio::test]
async fn accept_double_encoded_origin_urls() {
    let origin = start_origin().await;
    let url = format!("http://{}/seg.ts", origin);
    let double_encoded = urlencoding::encode(&url).into_owned();

    let response = get_uri(
        app(),
        &relay_uri("segment", Some(&double_encoded), Some("foo")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"0123456789");
}

#[tokio::test]
async fn answer_preflights_with_cors_headers() {
    for variant in ["key", "segment"] {
        let response = send(app(), "OPTIONS", &format!("/api/proxy/vod/{}", variant)).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            header_str(&response, header::ACCESS_CONTROL_ALLOW_METHODS),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(
            header_str(&response, header::ACCESS_CONTROL_ALLOW_HEADERS),
            Some("Content-Type, Range, Origin, Accept")
        );
    }
}

#[tokio::test]
async fn report_health_of_the_source_config() {
    let response = get_uri(app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["source_config"]["backend"], "static");
    assert_eq!(body["environment"], "development");
}
