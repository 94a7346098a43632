//! Origin image service client.

use async_trait::async_trait;
use axum::http::{header, HeaderValue};

use crate::http::response::{strip_hop_by_hop, AssetResponse};
use crate::observability::metrics;
use crate::origin::request::UpstreamRequest;

/// Boxed error used for transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to obtain any response from the origin.
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("Origin request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },
}

/// Anything that can answer an `UpstreamRequest`.
///
/// Non-success statuses are returned as responses, not errors.
#[async_trait]
pub trait OriginClient: Send + Sync {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<AssetResponse, OriginError>;
}

/// reqwest-backed origin client.
#[derive(Clone, Default)]
pub struct HttpOrigin {
    client: reqwest::Client,
}

impl HttpOrigin {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OriginClient for HttpOrigin {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<AssetResponse, OriginError> {
        let transport = |e: reqwest::Error| OriginError::Transport {
            url: request.url.clone(),
            source: Box::new(e),
        };

        let mut builder = self
            .client
            .get(&request.url)
            .headers(request.headers.clone());
        if !request.cache_everything {
            builder = builder
                .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
                .header(header::PRAGMA, HeaderValue::from_static("no-cache"));
        }

        metrics::record_origin_fetch(request.cache_everything);

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let mut headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport)?;
        strip_hop_by_hop(&mut headers);

        tracing::debug!(
            url = %request.url,
            status = %status,
            cache_everything = request.cache_everything,
            body_len = body.len(),
            "Origin responded"
        );

        Ok(AssetResponse::new(status, headers, body))
    }
}
