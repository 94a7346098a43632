//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all image handler
//! - Wire up middleware (request ID, tracing)
//! - Reject everything except GET
//! - Serve until shutdown, then drain background cache stores

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::asset::{AssetServer, ServeError};
use crate::cache::MemoryEdgeCache;
use crate::config::ProxyConfig;
use crate::http::request::InboundRequest;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<AssetServer>,
}

/// HTTP server for the image proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    assets: Arc<AssetServer>,
}

impl HttpServer {
    /// Server backed by the HTTP origin client and an in-memory edge cache.
    pub fn new(config: ProxyConfig) -> Self {
        let cache = MemoryEdgeCache::with_capacity(config.cache.max_capacity_bytes);
        let assets = AssetServer::from_config(&config.origin, Arc::new(cache));
        Self::with_assets(config, assets)
    }

    /// Server around an existing asset server.
    pub fn with_assets(config: ProxyConfig, assets: AssetServer) -> Self {
        let assets = Arc::new(assets);
        let router = Self::build_router(AppState {
            assets: assets.clone(),
        });
        Self {
            router,
            config,
            assets,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(handle_request))
            .route("/{*path}", any(handle_request))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run until `shutdown` fires, then wait for pending cache stores.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.origin.image_base(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(
            pending = self.assets.background().len(),
            "Draining background cache stores"
        );
        self.assets.background().drain().await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Method guard in front of the asset server.
async fn handle_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, _body) = request.into_parts();

    if parts.method != Method::GET {
        tracing::debug!(method = %parts.method, path = %parts.uri.path(), "Rejected non-GET request");
        let response = ServeError::MethodNotAllowed(parts.method).into_response();
        metrics::record_request(response.status().as_u16(), "none", start);
        return response;
    }

    let inbound = InboundRequest::from_parts(&parts);
    state.assets.serve(&inbound).await
}
