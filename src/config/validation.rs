//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every problem is
//! reported, not just the first one.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("origin.cloud_name is required (set it in the config file or via CLOUD_NAME)")]
    MissingCloudName,
    #[error("origin.cloud_name must not contain '/' or surrounding whitespace: {0:?}")]
    InvalidCloudName(String),
    #[error("origin.base_url is not an absolute http(s) URL: {0}")]
    InvalidBaseUrl(String),
    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let cloud_name = &config.origin.cloud_name;
    if cloud_name.trim().is_empty() {
        errors.push(ValidationError::MissingCloudName);
    } else if cloud_name.contains('/') || cloud_name.trim() != cloud_name {
        errors.push(ValidationError::InvalidCloudName(cloud_name.clone()));
    }

    match Url::parse(&config.origin.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(config.origin.base_url.clone())),
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.origin.cloud_name = "demo".into();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ProxyConfig::default();
        config.origin.base_url = "ftp://example.com".into();
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::MissingCloudName));
        assert!(errors.contains(&ValidationError::InvalidBaseUrl("ftp://example.com".into())));
    }

    #[test]
    fn test_cloud_name_with_slash() {
        let mut config = valid();
        config.origin.cloud_name = "a/b".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidCloudName("a/b".into())]
        );
    }

    #[test]
    fn test_cloud_name_with_surrounding_whitespace() {
        let mut config = valid();
        config.origin.cloud_name = " demo ".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidCloudName(" demo ".into())]
        );
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
