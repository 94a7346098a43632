//! Image asset serving.
//!
//! # Data Flow
//! ```text
//! InboundRequest (GET only)
//!     → server.rs (edge cache lookup, origin fetch, empty-body retry, validation)
//!     → tasks.rs (background cache store)
//!     → error.rs (failure → 404 / 500 response)
//! ```

pub mod error;
pub mod server;
pub mod tasks;

pub use error::ServeError;
pub use server::{AssetServer, CacheOutcome};
pub use tasks::BackgroundTasks;
