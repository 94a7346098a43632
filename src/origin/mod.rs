//! Origin image service access.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → request.rs (UpstreamRequest: image base + path, allow-listed headers, caching hint)
//!     → client.rs (OriginClient::fetch, buffered AssetResponse)
//! ```

pub mod client;
pub mod request;

pub use client::{BoxError, HttpOrigin, OriginClient, OriginError};
pub use request::UpstreamRequest;
