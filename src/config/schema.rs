//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the image proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream image service settings.
    pub origin: OriginConfig,

    /// In-memory edge cache settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Apply environment overrides on top of file or default values.
    ///
    /// `CLOUD_NAME` replaces `origin.cloud_name` when set, with surrounding
    /// whitespace removed.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(cloud_name) = std::env::var("CLOUD_NAME") {
            self.origin.set_cloud_name(&cloud_name);
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Origin image service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Scheme and host of the image service.
    pub base_url: String,

    /// Tenant namespace on the image service (`CLOUD_NAME`).
    pub cloud_name: String,
}

impl OriginConfig {
    /// Replace the cloud name, dropping surrounding whitespace.
    pub fn set_cloud_name(&mut self, cloud_name: &str) {
        self.cloud_name = cloud_name.trim().to_string();
    }

    /// Base URL every inbound path is appended to.
    pub fn image_base(&self) -> String {
        format!(
            "{}/{}/image",
            self.base_url.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "https://res.cloudinary.com".to_string(),
            cloud_name: String::new(),
        }
    }
}

/// Edge cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on the total size of cached bodies, in bytes.
    pub max_capacity_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
