//! Edge cache capability.
//!
//! The asset server only needs two operations from the cache: look a
//! response up by request identity, and store one. Storage, eviction and
//! consistency belong to the implementation; concurrent stores to the same
//! key may overwrite each other.

pub mod key;
pub mod memory;

use async_trait::async_trait;

use crate::http::response::AssetResponse;

pub use key::CacheKey;
pub use memory::MemoryEdgeCache;

/// Error raised by a cache backend.
#[derive(Debug, thiserror::Error)]
#[error("edge cache {operation} failed: {message}")]
pub struct CacheError {
    pub operation: &'static str,
    pub message: String,
}

impl CacheError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// A response cache keyed by request identity.
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// Return the stored response for `key`, or `None` on a miss.
    async fn lookup(&self, key: &CacheKey) -> Result<Option<AssetResponse>, CacheError>;

    /// Store `response` under `key`, replacing any previous entry.
    async fn store(&self, key: CacheKey, response: AssetResponse) -> Result<(), CacheError>;
}
