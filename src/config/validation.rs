//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject duplicate or empty service names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.discovery.address.trim().is_empty() {
        errors.push(ValidationError::new("discovery.address", "must not be empty"));
    }
    if HeaderName::from_bytes(config.discovery.index_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "discovery.index_header",
            format!("'{}' is not a valid header name", config.discovery.index_header),
        ));
    }
    if config.discovery.watch_wait_secs == 0 {
        errors.push(ValidationError::new("discovery.watch_wait_secs", "must be greater than 0"));
    }
    if config.discovery.query_timeout_secs == 0 {
        errors.push(ValidationError::new("discovery.query_timeout_secs", "must be greater than 0"));
    }

    let mut seen = HashSet::new();
    for name in config.services.names() {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("services", "service names must not be empty"));
        } else if !seen.insert(name.clone()) {
            errors.push(ValidationError::new("services", format!("duplicate service name '{}'", name)));
        }
    }
    if config.services.call_timeout_ms == 0 {
        errors.push(ValidationError::new("services.call_timeout_ms", "must be greater than 0"));
    }

    if config.tracing.collector_address.trim().is_empty() {
        errors.push(ValidationError::new("tracing.collector_address", "must not be empty"));
    }

    if url::Url::parse(&config.open_api.base_url).is_err() {
        errors.push(ValidationError::new(
            "open_api.base_url",
            format!("'{}' is not a URL", config.open_api.base_url),
        ));
    }
    if config.open_api.client_id.is_empty() || config.open_api.client_secret.is_empty() {
        errors.push(ValidationError::new("open_api", "client credentials must be set"));
    }

    if config.logging.directory.trim().is_empty() {
        errors.push(ValidationError::new("logging.directory", "must not be empty"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.security.enabled
        && HeaderName::from_bytes(config.security.header.as_bytes()).is_err()
    {
        errors.push(ValidationError::new(
            "security.header",
            format!("'{}' is not a valid header name", config.security.header),
        ));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    for header in &config.cors.extra_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.extra_headers",
                format!("'{}' is not a valid header name", header),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
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
    use crate::config::schema::Secret;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.discovery.address = "consul:8500".into();
        config.tracing.collector_address = "jaeger:4317".into();
        config.open_api.client_id = "id".into();
        config.open_api.client_secret = Secret::new("secret");
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = valid();
        config.listener.bind_address = "nope".into();
        config.services.club = config.services.auth.clone();
        config.services.call_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["listener.bind_address", "services", "services.call_timeout_ms"]);
    }
}
