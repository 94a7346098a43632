//! Caching reverse proxy for an image CDN.
//!
//! GET requests are answered from an edge cache when possible, otherwise
//! forwarded to the origin image service, validated, and stored for the
//! next caller.

pub mod asset;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod origin;

pub use asset::AssetServer;
pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
