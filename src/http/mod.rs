//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, method guard)
//!     → request.rs (snapshot method/URI/allow-listed headers)
//!     → asset server (cache lookup, origin fetch, validation)
//!     → response.rs (cache headers, canned error responses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, X_REQUEST_ID};
pub use response::AssetResponse;
pub use server::HttpServer;
