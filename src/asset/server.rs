//! Cache-read-through image serving.
//!
//! # Request flow
//! ```text
//! lookup ─hit, length>0──────────────────────────────▶ return cached
//!    │ hit, length==0 ─▶ fetch (bypass) ─▶ store if valid ─▶ return
//!    │ miss
//!    ▼
//! fetch (cache_everything) ─ok, length==0─▶ fetch (bypass) ─still empty─▶ EmptyBody
//!    │                                          │
//!    ▼                                          ▼
//! status check ─▶ content-type check ─▶ cache headers ─▶ store in background ─▶ return
//! ```

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::response::{IntoResponse, Response};

use crate::asset::error::ServeError;
use crate::asset::tasks::BackgroundTasks;
use crate::cache::{CacheKey, EdgeCache};
use crate::config::OriginConfig;
use crate::http::request::InboundRequest;
use crate::http::response::AssetResponse;
use crate::observability::metrics;
use crate::origin::{HttpOrigin, OriginClient, UpstreamRequest};

/// How a request was satisfied, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    /// Cached entry had an empty body and was refetched.
    Refreshed,
    Failed,
}

impl CacheOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Refreshed => "refreshed",
            Self::Failed => "failed",
        }
    }
}

/// Serves images from the edge cache, falling back to the origin.
pub struct AssetServer {
    image_base: String,
    origin: Arc<dyn OriginClient>,
    cache: Arc<dyn EdgeCache>,
    tasks: BackgroundTasks,
}

impl AssetServer {
    pub fn new(
        image_base: impl Into<String>,
        origin: Arc<dyn OriginClient>,
        cache: Arc<dyn EdgeCache>,
    ) -> Self {
        Self {
            image_base: image_base.into(),
            origin,
            cache,
            tasks: BackgroundTasks::new(),
        }
    }

    /// Asset server talking to the configured origin over HTTP.
    pub fn from_config(config: &OriginConfig, cache: Arc<dyn EdgeCache>) -> Self {
        Self::new(config.image_base(), Arc::new(HttpOrigin::default()), cache)
    }

    /// Pending cache stores.
    pub fn background(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Serve a GET request. Never fails: every error becomes a response.
    pub async fn serve(&self, request: &InboundRequest) -> Response {
        let start = Instant::now();

        let (response, outcome) = match self.try_serve(request).await {
            Ok((response, outcome)) => (response.into_response(), outcome),
            Err(error) => {
                log_failure(request, &error);
                (error.into_response(), CacheOutcome::Failed)
            }
        };

        metrics::record_request(response.status().as_u16(), outcome.as_str(), start);
        response
    }

    async fn try_serve(
        &self,
        request: &InboundRequest,
    ) -> Result<(AssetResponse, CacheOutcome), ServeError> {
        let key = CacheKey::from_request(request);

        match self.lookup(&key).await {
            Some(cached) if cached.declares_empty_body() => {
                let response = self.refresh_empty_entry(request, key).await?;
                Ok((response, CacheOutcome::Refreshed))
            }
            Some(cached) => {
                tracing::info!(path = %request.path(), "Served from edge cache");
                Ok((cached, CacheOutcome::Hit))
            }
            None => {
                let response = self.fetch_from_origin(request, key).await?;
                Ok((response, CacheOutcome::Miss))
            }
        }
    }

    /// A failing cache lookup degrades to a miss.
    async fn lookup(&self, key: &CacheKey) -> Option<AssetResponse> {
        match self.cache.lookup(key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Edge cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn fetch_from_origin(
        &self,
        request: &InboundRequest,
        key: CacheKey,
    ) -> Result<AssetResponse, ServeError> {
        let upstream = UpstreamRequest::for_inbound(&self.image_base, request, true);
        let mut response = self.origin.fetch(&upstream).await?;

        if response.is_empty_success() {
            tracing::warn!(
                url = %upstream.url,
                "Received zero-length response, retrying without cache"
            );
            response = self.origin.fetch(&upstream.with_caching(false)).await?;
            if response.is_empty_success() {
                return Err(ServeError::EmptyBody);
            }
        }

        if !response.status.is_success() {
            return Err(ServeError::upstream(response.status));
        }

        match response.content_type() {
            Some(content_type) if is_image(content_type) => {}
            other => return Err(ServeError::InvalidContentType(other.map(str::to_string))),
        }

        let response = response
            .with_image_cache_headers()
            .with_default_content_type();

        if response.is_cacheable() {
            tracing::info!(path = %request.path(), "Fetched from origin");
            self.store_in_background(key, response.clone());
        }

        Ok(response)
    }

    /// Refetch for a cached entry that declares an empty body.
    ///
    /// Unlike the miss path this makes a single attempt: a response that is
    /// still empty, or not an image, is returned as-is. Whether this path
    /// should get the same retry and validation is an open product question.
    async fn refresh_empty_entry(
        &self,
        request: &InboundRequest,
        key: CacheKey,
    ) -> Result<AssetResponse, ServeError> {
        tracing::warn!(path = %request.path(), "Cached entry has empty body, refetching");

        let upstream = UpstreamRequest::for_inbound(&self.image_base, request, false);
        let response = self.origin.fetch(&upstream).await?.with_image_cache_headers();

        if response.is_cacheable() {
            self.store_in_background(key, response.clone());
        }

        Ok(response)
    }

    /// Fire-and-forget store; the caller never waits on or sees its outcome.
    fn store_in_background(&self, key: CacheKey, response: AssetResponse) {
        let cache = self.cache.clone();
        self.tasks.spawn("edge_cache_store", async move {
            let result = cache.store(key, response).await;
            metrics::record_cache_store(result.is_ok());
            result
        });
    }
}

fn is_image(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("image/")
}

fn log_failure(request: &InboundRequest, error: &ServeError) {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    tracing::error!(
        url = %request.url(),
        request_id = request.request_id.as_deref().unwrap_or("unknown"),
        error = %error,
        stack = %error.report(),
        timestamp_ms,
        "Error serving asset"
    );
}
