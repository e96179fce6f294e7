use axum::http::{HeaderMap, HeaderValue, header};

use super::Variant;

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Range, Origin, Accept";
// browsers hide these on cross origin responses unless they're exposed, players want both
pub const CORS_EXPOSE_HEADERS: &str = "Content-Length, Content-Range";

/// the fixed cors set every relay response (and preflight) carries
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(CORS_EXPOSE_HEADERS),
    );
    headers
}

/// builds the outbound headers from what the origin sent. no io, same input same output.
///
/// content type is passed through verbatim, otherwise it falls back to the variant default.
/// segments also get `Accept-Ranges` and the origin's `Content-Length` (if it had one) so
/// players can show progress and seek. we never split ranges ourselves, whatever range the
/// origin answered is what goes out.
pub fn translate(origin_headers: &HeaderMap, variant: Variant) -> HeaderMap {
    let mut headers = cors_headers();

    let content_type = origin_headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(variant.default_content_type()));
    headers.insert(header::CONTENT_TYPE, content_type);

    if variant == Variant::Segment {
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

        if let Some(length) = origin_headers.get(header::CONTENT_LENGTH) {
            headers.insert(header::CONTENT_LENGTH, length.clone());
        }
    }

    headers
}
