//! Process-local edge cache backed by Moka.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::header;
use moka::future::Cache as MokaCache;
use moka::Expiry;

use crate::cache::key::CacheKey;
use crate::cache::{CacheError, EdgeCache};
use crate::http::response::AssetResponse;

/// Default byte budget for cached bodies.
pub const DEFAULT_CAPACITY_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Clone)]
struct CacheEntry {
    response: AssetResponse,
    ttl: Option<Duration>,
}

/// Per-entry lifetime taken from the stored `cache-control: max-age`.
struct MaxAgeExpiry;

impl Expiry<CacheKey, CacheEntry> for MaxAgeExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-memory response cache.
///
/// Entries expire according to the `max-age` of their `cache-control`
/// header; entries without one live until evicted. Total body size is
/// bounded, least recently used entries go first.
#[derive(Clone)]
pub struct MemoryEdgeCache {
    cache: MokaCache<CacheKey, CacheEntry>,
}

impl MemoryEdgeCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_BYTES)
    }

    /// Cache holding at most `max_bytes` of response bodies.
    pub fn with_capacity(max_bytes: u64) -> Self {
        let cache = MokaCache::<CacheKey, CacheEntry>::builder()
            .weigher(|_key: &CacheKey, entry: &CacheEntry| {
                entry.response.body.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(max_bytes)
            .expire_after(MaxAgeExpiry)
            .build();

        tracing::debug!(max_bytes, "Edge cache created");
        Self { cache }
    }

    /// Number of live entries, after pending maintenance has run.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryEdgeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<AssetResponse>, CacheError> {
        Ok(self.cache.get(key).await.map(|entry| entry.response))
    }

    async fn store(&self, key: CacheKey, response: AssetResponse) -> Result<(), CacheError> {
        let ttl = max_age(&response);
        // Already stale; drop whatever was there instead of storing.
        if ttl == Some(Duration::ZERO) {
            self.cache.invalidate(&key).await;
            return Ok(());
        }
        self.cache.insert(key, CacheEntry { response, ttl }).await;
        Ok(())
    }
}

/// `max-age` directive of the response's `cache-control`, if any.
fn max_age(response: &AssetResponse) -> Option<Duration> {
    let value = response.headers.get(header::CACHE_CONTROL)?.to_str().ok()?;
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
    use bytes::Bytes;

    use crate::http::request::InboundRequest;

    fn key(path: &str) -> CacheKey {
        let (parts, _) = Request::get(path).body(()).unwrap().into_parts();
        CacheKey::from_request(&InboundRequest::from_parts(&parts))
    }

    fn response(cache_control: Option<&'static str>, body: &'static str) -> AssetResponse {
        let mut headers = HeaderMap::new();
        if let Some(cc) = cache_control {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cc));
        }
        AssetResponse::new(StatusCode::OK, headers, Bytes::from_static(body.as_bytes()))
    }

    #[tokio::test]
    async fn test_store_and_lookup() {
        let cache = MemoryEdgeCache::new();
        assert!(cache.lookup(&key("/a.jpg")).await.unwrap().is_none());

        cache
            .store(key("/a.jpg"), response(Some("public, max-age=60"), "first"))
            .await
            .unwrap();
        let hit = cache.lookup(&key("/a.jpg")).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"first"));

        // Racing writers simply overwrite.
        cache
            .store(key("/a.jpg"), response(None, "second"))
            .await
            .unwrap();
        let hit = cache.lookup(&key("/a.jpg")).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"second"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_zero_max_age_expires_immediately() {
        let cache = MemoryEdgeCache::new();
        cache
            .store(key("/b.jpg"), response(Some("public, max-age=0"), "x"))
            .await
            .unwrap();

        assert!(cache.lookup(&key("/b.jpg")).await.unwrap().is_none());
        assert!(cache.is_empty().await);

        // Replaces a live entry rather than leaving it behind.
        cache
            .store(key("/b.jpg"), response(Some("max-age=60"), "x"))
            .await
            .unwrap();
        cache
            .store(key("/b.jpg"), response(Some("max-age=0"), "y"))
            .await
            .unwrap();
        assert!(cache.lookup(&key("/b.jpg")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_freed_without_lookup() {
        let cache = MemoryEdgeCache::new();
        for i in 0..20 {
            cache
                .store(key(&format!("/a.jpg?{}", i)), response(Some("max-age=1"), "body"))
                .await
                .unwrap();
        }
        assert_eq!(cache.len().await, 20);

        // Moka's own clock, so real time has to pass.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_bounds_total_body_size() {
        let cache = MemoryEdgeCache::with_capacity(64);
        for i in 0..50 {
            cache
                .store(
                    key(&format!("/big.jpg?{}", i)),
                    response(None, "0123456789abcdef"),
                )
                .await
                .unwrap();
        }

        // 16-byte bodies in a 64-byte budget.
        assert!(cache.len().await <= 4);
    }

    #[test]
    fn test_max_age_parsing() {
        assert_eq!(
            max_age(&response(
                Some("public, max-age=14400, stale-while-revalidate=3600"),
                ""
            )),
            Some(Duration::from_secs(14400))
        );
        assert_eq!(max_age(&response(Some("no-store"), "")), None);
        assert_eq!(max_age(&response(None, "")), None);
    }
}
