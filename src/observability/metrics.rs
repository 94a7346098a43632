//! Metrics collection and exposition.
//!
//! # Metrics
//! - `image_proxy_requests_total` (counter): requests by status and cache outcome
//! - `image_proxy_request_duration_seconds` (histogram): latency by cache outcome
//! - `image_proxy_origin_fetches_total` (counter): origin fetches by caching hint
//! - `image_proxy_cache_stores_total` (counter): background stores by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, cache: &'static str, start: Instant) {
    counter!(
        "image_proxy_requests_total",
        "status" => status.to_string(),
        "cache" => cache
    )
    .increment(1);
    histogram!("image_proxy_request_duration_seconds", "cache" => cache)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_origin_fetch(cache_everything: bool) {
    let caching = if cache_everything { "enabled" } else { "bypass" };
    counter!("image_proxy_origin_fetches_total", "caching" => caching).increment(1);
}

pub fn record_cache_store(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("image_proxy_cache_stores_total", "outcome" => outcome).increment(1);
}
