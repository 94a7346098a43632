//! Upstream request construction.

use axum::http::HeaderMap;

use crate::http::request::{allow_listed, InboundRequest};

/// A single request to the origin image service.
///
/// Built fresh for every attempt and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub url: String,
    /// Allow-listed client headers.
    pub headers: HeaderMap,
    /// Fetch-layer caching hint. `false` forces a fresh origin hit.
    pub cache_everything: bool,
}

impl UpstreamRequest {
    /// Map an inbound request onto `<image_base><path>`; the query string is dropped.
    pub fn for_inbound(image_base: &str, inbound: &InboundRequest, cache_everything: bool) -> Self {
        Self {
            url: format!("{}{}", image_base, inbound.path()),
            headers: allow_listed(&inbound.headers),
            cache_everything,
        }
    }

    /// Same target and headers, different caching hint.
    pub fn with_caching(&self, cache_everything: bool) -> Self {
        Self {
            cache_everything,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};

    #[test]
    fn test_for_inbound_drops_query() {
        let (parts, _) = Request::get("/w_200/sample.jpg?v=3")
            .header(header::ACCEPT, "image/webp")
            .header(header::COOKIE, "a=b")
            .body(())
            .unwrap()
            .into_parts();
        let inbound = InboundRequest::from_parts(&parts);

        let upstream =
            UpstreamRequest::for_inbound("https://res.cloudinary.com/demo/image", &inbound, true);

        assert_eq!(upstream.url, "https://res.cloudinary.com/demo/image/w_200/sample.jpg");
        assert_eq!(upstream.headers.len(), 1);
        assert_eq!(upstream.headers[header::ACCEPT], "image/webp");
        assert!(upstream.cache_everything);

        let retry = upstream.with_caching(false);
        assert!(!retry.cache_everything);
        assert_eq!(retry.url, upstream.url);
        assert_eq!(retry.headers, upstream.headers);
    }

    #[test]
    fn test_forwards_accept_encoding_and_user_agent() {
        let (parts, _) = Request::get("/sample.png")
            .header(header::ACCEPT_ENCODING, "gzip, br")
            .header(header::USER_AGENT, "curl/8.0")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(())
            .unwrap()
            .into_parts();
        let inbound = InboundRequest::from_parts(&parts);

        let upstream = UpstreamRequest::for_inbound("http://origin.test/demo/image", &inbound, false);

        assert_eq!(upstream.headers.len(), 2);
        assert_eq!(upstream.headers[header::ACCEPT_ENCODING], "gzip, br");
        assert_eq!(upstream.headers[header::USER_AGENT], "curl/8.0");
        assert!(!upstream.headers.contains_key(header::AUTHORIZATION));
    }
}
