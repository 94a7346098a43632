//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    response::Response,
    Router,
};
use tokio::net::TcpListener;

use image_edge_cache::cache::MemoryEdgeCache;
use image_edge_cache::origin::HttpOrigin;
use image_edge_cache::{AssetServer, HttpServer, ProxyConfig, Shutdown};

/// What the mock origin answers for one request.
pub struct OriginReply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: &'static str,
}

impl OriginReply {
    pub fn image(body: &'static str) -> Self {
        Self {
            status: 200,
            content_type: Some("image/jpeg"),
            body,
        }
    }

    pub fn empty() -> Self {
        Self::image("")
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/html"),
            body: "<html>origin error</html>",
        }
    }
}

/// A request as seen by the mock origin.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

type ReplyFn = dyn Fn(u32) -> OriginReply + Send + Sync;

#[derive(Clone)]
struct OriginState {
    reply: Arc<ReplyFn>,
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockOrigin {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockOrigin {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock origin whose reply depends on the zero-based call number.
pub async fn start_programmable_origin<F>(reply: F) -> MockOrigin
where
    F: Fn(u32) -> OriginReply + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicU32::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = OriginState {
        reply: Arc::new(reply),
        calls: calls.clone(),
        requests: requests.clone(),
    };

    let app = Router::new().fallback(origin_handler).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockOrigin {
        addr,
        calls,
        requests,
    }
}

async fn origin_handler(State(state): State<OriginState>, request: Request) -> Response {
    let call = state.calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        headers: request.headers().clone(),
    });

    let reply = (state.reply)(call);
    let mut builder = Response::builder()
        .status(reply.status)
        .header(header::CONTENT_LENGTH, reply.body.len());
    if let Some(content_type) = reply.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(reply.body)).unwrap()
}

/// A running proxy pointed at a mock origin.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub cache: MemoryEdgeCache,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the background store has landed `count` entries.
    pub async fn wait_for_cache_entries(&self, count: u64) -> bool {
        for _ in 0..50 {
            if self.cache.len().await >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

pub async fn start_proxy(origin: &MockOrigin) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.origin.base_url = format!("http://{}", origin.addr);
    config.origin.cloud_name = "demo".into();

    let cache = MemoryEdgeCache::new();
    let assets = AssetServer::new(
        config.origin.image_base(),
        Arc::new(HttpOrigin::new(client())),
        Arc::new(cache.clone()),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::with_assets(config, assets);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        cache,
        shutdown,
    }
}

/// HTTP client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
