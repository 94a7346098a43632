//! Response handling and transformation.
//!
//! # Responsibilities
//! - Carry buffered origin/cached responses (`AssetResponse`)
//! - Strip hop-by-hop headers from upstream responses
//! - Rewrite caching headers on image responses
//! - Build the canned 405/404/500 responses

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

/// Cache policy applied to every image served from the origin.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=14400, stale-while-revalidate=3600";

/// Not-found responses are cacheable for two hours.
pub const NOT_FOUND_CACHE_CONTROL: &str = "public, max-age=7200";

/// Error responses must never be cached.
pub const ERROR_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate";

/// Content type assumed when the origin omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Header carrying the failure message on 500 responses.
pub const X_ERROR_MESSAGE: &str = "x-error-message";

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// A fully buffered HTTP response.
///
/// The body is `Bytes`, so `clone()` is a cheap reference-counted duplicate.
/// That duplicate is what gets handed to the edge cache while the original
/// is returned to the client.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl AssetResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// The `content-length` declared by the sender, if present and numeric.
    pub fn declared_length(&self) -> Option<u64> {
        self.headers
            .get(header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    /// A declared `content-length` of exactly zero.
    pub fn declares_empty_body(&self) -> bool {
        self.declared_length() == Some(0)
    }

    /// Success status with a zero-length body: the known origin defect.
    pub fn is_empty_success(&self) -> bool {
        self.status.is_success() && self.declares_empty_body()
    }

    /// Only successful responses with a declared non-zero length are stored.
    pub fn is_cacheable(&self) -> bool {
        self.status.is_success() && self.declared_length().is_some_and(|len| len > 0)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Overwrite `cache-control` and `vary` for edge caching.
    pub fn with_image_cache_headers(mut self) -> Self {
        self.headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(IMAGE_CACHE_CONTROL),
        );
        self.headers
            .insert(header::VARY, HeaderValue::from_static("Accept"));
        self
    }

    /// Fill in `content-type` when the upstream left it out.
    pub fn with_default_content_type(mut self) -> Self {
        self.headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        self
    }
}

impl IntoResponse for AssetResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Remove connection-scoped headers before a response is re-served.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// 405 for anything that is not a GET.
pub fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET"), (header::CACHE_CONTROL, "no-store")],
        "Method not allowed",
    )
        .into_response()
}

/// 404 when the origin has no such image.
pub fn image_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CACHE_CONTROL, NOT_FOUND_CACHE_CONTROL)],
        "Image not found",
    )
        .into_response()
}

/// 500 carrying the failure message in the body and `X-Error-Message`.
pub fn image_loading_error(message: &str) -> Response {
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::CACHE_CONTROL, ERROR_CACHE_CONTROL),
        ],
        format!("Image loading error: {}", message),
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(&header_safe(message)) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(X_ERROR_MESSAGE), value);
    }
    response
}

/// Replace anything a header value cannot carry.
fn header_safe(message: &str) -> String {
    message
        .chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}
