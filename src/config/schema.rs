//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Discovery backend settings.
    pub discovery: DiscoveryConfig,

    /// Logical backend names and outbound call policy.
    pub services: ServicesConfig,

    /// Tracing collector settings.
    pub tracing: TracingConfig,

    /// External open-api credentials.
    pub open_api: OpenApiConfig,

    /// Per-domain log sinks.
    pub logging: DomainLogConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security filter settings.
    pub security: SecurityConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A credential that must never show up in logs.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
        }
    }
}

/// Discovery backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Consul HTTP address (`CONSUL_ADDRESS`), with or without scheme.
    pub address: String,

    /// Header carrying the change index on the discovery webhook (`CONSUL_INDEX_HEADER`).
    pub index_header: String,

    /// Keep the registry cache warm with blocking watch queries.
    pub watch_enabled: bool,

    /// Maximum wait of one blocking query, in seconds.
    pub watch_wait_secs: u64,

    /// Timeout for one non-blocking discovery query, in seconds.
    pub query_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            index_header: "X-Consul-Index".to_string(),
            watch_enabled: true,
            watch_wait_secs: 30,
            query_timeout_secs: 5,
        }
    }
}

/// Instance selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    RoundRobin,
    Random,
}

/// Logical names of the backends and the outbound call policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub auth: String,
    pub club: String,
    pub outing: String,
    pub schedule: String,
    pub announcement: String,

    /// Selection strategy used by every service client.
    pub strategy: StrategyKind,

    /// Default deadline of one backend call, in milliseconds.
    pub call_timeout_ms: u64,
}

impl ServicesConfig {
    /// All declared service names, in declaration order.
    pub fn names(&self) -> Vec<String> {
        vec![
            self.auth.clone(),
            self.club.clone(),
            self.outing.clone(),
            self.schedule.clone(),
            self.announcement.clone(),
        ]
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            auth: "DMS.SMS.v1.service.auth".to_string(),
            club: "DMS.SMS.v1.service.club".to_string(),
            outing: "DMS.SMS.v1.service.outing".to_string(),
            schedule: "DMS.SMS.v1.service.schedule".to_string(),
            announcement: "DMS.SMS.v1.service.announcement".to_string(),
            strategy: StrategyKind::RoundRobin,
            call_timeout_ms: 5_000,
        }
    }
}

/// Tracing collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Collector OTLP gRPC endpoint, `host:port` or a URL (`JAEGER_ADDRESS`).
    pub collector_address: String,

    /// Name spans are reported under.
    pub service_name: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            collector_address: String::new(),
            service_name: "DMS.SMS.v1.api.gateway".to_string(),
        }
    }
}

/// Naver open-api configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenApiConfig {
    /// Base URL of the open-api host.
    pub base_url: String,

    /// `NAVER_CLIENT_ID`.
    pub client_id: String,

    /// `NAVER_CLIENT_SECRET`.
    pub client_secret: Secret,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openapi.naver.com".to_string(),
            client_id: String::new(),
            client_secret: Secret::default(),
            timeout_secs: 5,
        }
    }
}

/// Per-domain log sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainLogConfig {
    /// Directory holding `<domain>.log` files; created if absent.
    pub directory: String,
}

impl Default for DomainLogConfig {
    fn default() -> Self {
        Self {
            directory: "/usr/share/filebeat/log/dms-sms".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable the security header check.
    pub enabled: bool,

    /// Header every request must carry.
    pub header: String,

    /// Accepted header values. Empty accepts any well-formed value.
    pub allowed_values: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header: "Request-Security".to_string(),
            allowed_values: Vec::new(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Cross-origin policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows every origin.
    pub allowed_origins: Vec<String>,

    /// Headers allowed on top of the defaults.
    pub extra_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            extra_headers: vec!["Authorization".to_string(), "Request-Security".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit process logs as JSON.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
