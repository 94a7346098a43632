//! Inbound request capture.
//!
//! # Responsibilities
//! - Snapshot the parts of an inbound request the asset path needs
//! - Restrict forwarded headers to an allow-list
//! - Expose the request ID assigned by the request-id layer

use axum::http::{header, request::Parts, HeaderMap, HeaderName, Method, Uri};

/// Header name carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Headers copied from the client to the origin. Everything else is dropped.
pub const FORWARDED_HEADERS: [HeaderName; 3] =
    [header::ACCEPT, header::ACCEPT_ENCODING, header::USER_AGENT];

/// Immutable view of an inbound request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    /// Host the client addressed, used for cache identity and logging.
    pub host: Option<String>,
    /// Allow-listed headers only.
    pub headers: HeaderMap,
    pub request_id: Option<String>,
}

impl InboundRequest {
    /// Capture method, URI, host and the allow-listed headers.
    pub fn from_parts(parts: &Parts) -> Self {
        let host = parts
            .uri
            .authority()
            .map(|a| a.to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            });

        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            host,
            headers: allow_listed(&parts.headers),
            request_id,
        }
    }

    /// Path component only, query string excluded.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn accept(&self) -> Option<&str> {
        self.headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
    }

    pub fn accept_encoding(&self) -> Option<&str> {
        self.headers
            .get(header::ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok())
    }

    /// Best-effort absolute URL for logs.
    pub fn url(&self) -> String {
        let path_and_query = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        match &self.host {
            Some(host) => format!("http://{}{}", host, path_and_query),
            None => path_and_query.to_string(),
        }
    }
}

/// Copy only the forwarded headers that are actually present.
pub fn allow_listed(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(&name) {
            forwarded.insert(name, value.clone());
        }
    }
    forwarded
}
