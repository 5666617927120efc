//! Discovery backends.
//!
//! # Responsibilities
//! - Answer "which instances of service X are live right now"
//! - Support blocking follow-up queries for watches
//!
//! # Design Decisions
//! - Backends are stateless query adapters; caching lives in the registry
//! - Consul is queried through its health endpoint so only passing
//!   instances are returned

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use url::Url;

use crate::discovery::instance::{Resolution, ServiceInstance, ServiceName};

/// Errors raised while querying a discovery backend.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid discovery address '{0}'")]
    InvalidAddress(String),

    #[error("discovery backend unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("discovery backend answered {status} for service {service}")]
    Status { service: ServiceName, status: u16 },

    #[error("undecodable discovery response for service {service}: {source}")]
    Decode {
        service: ServiceName,
        #[source]
        source: reqwest::Error,
    },

    #[error("service {0} is not declared")]
    UnknownService(ServiceName),
}

/// A source of service membership.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Resolve the live instances of `service`.
    ///
    /// With `after = Some(index)` the call may block until the membership
    /// changes past `index` or the backend's wait time elapses.
    async fn resolve(
        &self,
        service: &ServiceName,
        after: Option<u64>,
    ) -> Result<Resolution, DiscoveryError>;
}

/// Consul health-endpoint backend.
#[derive(Debug, Clone)]
pub struct ConsulDiscovery {
    client: reqwest::Client,
    base: Url,
    wait: Duration,
    query_timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConsulEntry {
    node: ConsulNode,
    service: ConsulService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConsulNode {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConsulService {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    address: String,
    port: u16,
    #[serde(default)]
    meta: Option<BTreeMap<String, String>>,
}

impl From<ConsulEntry> for ServiceInstance {
    fn from(entry: ConsulEntry) -> Self {
        let host = if entry.service.address.is_empty() {
            entry.node.address
        } else {
            entry.service.address
        };
        ServiceInstance {
            id: entry.service.id,
            address: format!("{}:{}", host, entry.service.port),
            metadata: entry.service.meta.unwrap_or_default(),
        }
    }
}

impl ConsulDiscovery {
    /// Build a client for `address` (`host:port` or a full URL).
    pub fn new(address: &str, wait: Duration, query_timeout: Duration) -> Result<Self, DiscoveryError> {
        let with_scheme = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };
        let base = Url::parse(&with_scheme)
            .map_err(|_| DiscoveryError::InvalidAddress(address.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(query_timeout)
            .build()
            .map_err(DiscoveryError::Unreachable)?;

        Ok(Self {
            client,
            base,
            wait,
            query_timeout,
        })
    }

    fn health_url(&self, service: &ServiceName, after: Option<u64>) -> Result<Url, DiscoveryError> {
        let mut url = self
            .base
            .join(&format!("/v1/health/service/{}", service))
            .map_err(|_| DiscoveryError::InvalidAddress(self.base.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("passing", "true");
            if let Some(index) = after {
                query.append_pair("index", &index.to_string());
                query.append_pair("wait", &format!("{}s", self.wait.as_secs()));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Discovery for ConsulDiscovery {
    async fn resolve(
        &self,
        service: &ServiceName,
        after: Option<u64>,
    ) -> Result<Resolution, DiscoveryError> {
        let url = self.health_url(service, after)?;
        // A blocking query may legitimately take the whole wait time.
        let timeout = match after {
            Some(_) => self.wait + self.query_timeout,
            None => self.query_timeout,
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(DiscoveryError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                service: service.clone(),
                status: status.as_u16(),
            });
        }

        let index = response
            .headers()
            .get("x-consul-index")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let entries: Vec<ConsulEntry> = response.json().await.map_err(|source| DiscoveryError::Decode {
            service: service.clone(),
            source,
        })?;

        Ok(Resolution {
            instances: entries.into_iter().map(ServiceInstance::from).collect(),
            index,
        })
    }
}

/// Fixed membership, replaceable at runtime. Used for local runs and tests.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    services: RwLock<HashMap<ServiceName, Vec<ServiceInstance>>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with_service(self, service: impl Into<ServiceName>, instances: Vec<ServiceInstance>) -> Self {
        self.set(service, instances);
        self
    }

    /// Replace the membership of `service`.
    pub fn set(&self, service: impl Into<ServiceName>, instances: Vec<ServiceInstance>) {
        self.services.write().insert(service.into(), instances);
    }

    /// Forget `service`; resolving it fails until it is set again.
    pub fn remove(&self, service: &ServiceName) {
        self.services.write().remove(service);
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn resolve(
        &self,
        service: &ServiceName,
        after: Option<u64>,
    ) -> Result<Resolution, DiscoveryError> {
        if after.is_some() {
            // Static membership never changes on its own; a watch just parks.
            std::future::pending::<()>().await;
        }
        self.services
            .read()
            .get(service)
            .cloned()
            .map(|instances| Resolution {
                instances,
                index: Some(1),
            })
            .ok_or_else(|| DiscoveryError::UnknownService(service.clone()))
    }
}
