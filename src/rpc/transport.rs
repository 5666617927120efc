//! Backend transport.
//!
//! # Responsibilities
//! - Deliver one call to one already-selected instance
//! - Attach the correlation id and forwarded metadata
//! - Classify failures (unreachable / timeout / rejected)
//!
//! # Design Decisions
//! - The transport never selects instances and never retries
//! - Wire format: `POST http://<instance>/rpc/<Capability>.<Method>` with a
//!   JSON payload `{params, query, body}`; reply is a JSON document

use async_trait::async_trait;
use serde_json::Value;

use crate::discovery::ServiceInstance;
use crate::observability::X_REQUEST_ID;
use crate::rpc::request::RpcRequest;

/// Transport-level failure, before mapping into a gateway error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("instance {address} unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("instance {address} timed out")]
    Timeout { address: String },

    #[error("instance {address} rejected the call: {reason}")]
    Rejected { address: String, reason: String },
}

/// Delivers a call to a concrete instance.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(
        &self,
        instance: &ServiceInstance,
        endpoint: &str,
        request: &RpcRequest,
    ) -> Result<Value, TransportError>;
}

/// JSON-over-HTTP transport built on `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(
        &self,
        instance: &ServiceInstance,
        endpoint: &str,
        request: &RpcRequest,
    ) -> Result<Value, TransportError> {
        let url = format!("http://{}/rpc/{}", instance.address, endpoint);
        let mut builder = self
            .client
            .post(url)
            .header(X_REQUEST_ID, request.correlation.as_str())
            .json(&request.payload());
        for (name, value) in &request.metadata {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let address = || instance.address.clone();
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { address: address() }
            } else {
                TransportError::Unreachable {
                    address: address(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                address: address(),
                reason: format!("status {}: {}", status.as_u16(), detail.trim()),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { address: address() }
            } else {
                TransportError::Rejected {
                    address: address(),
                    reason: format!("undecodable reply: {}", e),
                }
            }
        })
    }
}
