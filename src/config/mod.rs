//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLOUD_NAME environment override
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed explicitly to the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields except the cloud name have defaults

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{config_from_env, load_config, ConfigError};
pub use schema::{
    CacheConfig, ListenerConfig, LogFormat, ObservabilityConfig, OriginConfig, ProxyConfig,
};
pub use validation::ValidationError;
