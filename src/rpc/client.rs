//! Load-balanced service client.
//!
//! # Responsibilities
//! - Pick a fresh instance for every call (no affinity)
//! - Bound every call with a deadline
//! - Map transport failures into gateway errors
//!
//! # Design Decisions
//! - No internal retries: a failed call is reported, not repeated
//! - The instance list is read from the registry cache; discovery is never
//!   queried on the call path
//! - Dropping the call future (client went away) drops the in-flight request

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::Instrument;

use crate::discovery::{ServiceName, ServiceRegistry};
use crate::error::{GatewayError, GatewayResult};
use crate::load_balancer::SelectionStrategy;
use crate::observability::metrics;
use crate::rpc::request::RpcRequest;
use crate::rpc::transport::{RpcTransport, TransportError};

/// Calls one logical service through whichever instance the strategy picks.
#[derive(Clone)]
pub struct ServiceClient {
    service: ServiceName,
    registry: Arc<ServiceRegistry>,
    strategy: Arc<dyn SelectionStrategy>,
    transport: Arc<dyn RpcTransport>,
    timeout: Duration,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.service)
            .field("strategy", &self.strategy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServiceClient {
    pub fn new(
        service: ServiceName,
        registry: Arc<ServiceRegistry>,
        strategy: Arc<dyn SelectionStrategy>,
        transport: Arc<dyn RpcTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            registry,
            strategy,
            transport,
            timeout,
        }
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// Invoke `endpoint` on one selected instance.
    pub async fn invoke(&self, endpoint: &'static str, request: RpcRequest) -> GatewayResult<Value> {
        let start = Instant::now();

        let instances = self.registry.instances(&self.service).unwrap_or_default();
        let Some(instance) = self.strategy.select(&self.service, &instances) else {
            tracing::warn!(service = %self.service, endpoint, "No live instance to select");
            let result = Err(GatewayError::BackendUnavailable {
                service: self.service.clone(),
            });
            metrics::record_backend_call(self.service.as_str(), metrics::backend_outcome(&result), start);
            return result;
        };

        let deadline = request.deadline.unwrap_or(self.timeout);
        let span = tracing::info_span!(
            "backend_call",
            service = %self.service,
            endpoint,
            instance = %instance.address,
            correlation_id = %request.correlation,
        );

        let outcome = tokio::time::timeout(deadline, self.transport.call(instance, endpoint, &request))
            .instrument(span)
            .await;

        let result = match outcome {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(TransportError::Unreachable { address, reason })) => {
                tracing::warn!(service = %self.service, endpoint, instance = %address, reason = %reason, "Backend unreachable");
                Err(GatewayError::BackendUnavailable {
                    service: self.service.clone(),
                })
            }
            Ok(Err(TransportError::Timeout { .. })) | Err(_) => Err(GatewayError::BackendTimeout {
                service: self.service.clone(),
                after: deadline,
            }),
            Ok(Err(TransportError::Rejected { reason, .. })) => Err(GatewayError::BackendRejected {
                service: self.service.clone(),
                reason,
            }),
        };

        metrics::record_backend_call(self.service.as_str(), metrics::backend_outcome(&result), start);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{ServiceInstance, StaticDiscovery};
    use crate::load_balancer::RoundRobin;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(String, String, String)>>,
        delay: Option<Duration>,
        fail_with: Option<fn(&str) -> TransportError>,
    }

    #[async_trait]
    impl RpcTransport for RecordingTransport {
        async fn call(
            &self,
            instance: &ServiceInstance,
            endpoint: &str,
            request: &RpcRequest,
        ) -> Result<Value, TransportError> {
            self.calls.lock().push((
                instance.id.clone(),
                endpoint.to_string(),
                request.correlation.to_string(),
            ));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.fail_with {
                Some(make) => Err(make(&instance.address)),
                None => Ok(json!({ "status": 200, "instance": instance.id })),
            }
        }
    }

    async fn client_with(
        instances: Vec<ServiceInstance>,
        transport: Arc<RecordingTransport>,
        timeout: Duration,
    ) -> ServiceClient {
        let discovery = Arc::new(StaticDiscovery::new().with_service("club", instances));
        let registry = Arc::new(ServiceRegistry::connect(discovery, vec!["club".into()]).await.unwrap());
        ServiceClient::new("club".into(), registry, Arc::new(RoundRobin::new()), transport, timeout)
    }

    fn abc() -> Vec<ServiceInstance> {
        // Deliberately unsorted: the registry orders by address.
        vec![
            ServiceInstance::new("C", "10.0.0.3:80"),
            ServiceInstance::new("A", "10.0.0.1:80"),
            ServiceInstance::new("B", "10.0.0.2:80"),
        ]
    }

    #[tokio::test]
    async fn test_round_robin_sequence_through_client() {
        let transport = Arc::new(RecordingTransport::default());
        let client = client_with(abc(), transport.clone(), Duration::from_secs(1)).await;

        for _ in 0..6 {
            client.invoke("ClubStudent.GetClubInformWithUUID", RpcRequest::new("corr".into())).await.unwrap();
        }

        let ids: Vec<_> = transport.calls.lock().iter().map(|c| c.0.clone()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_empty_instance_set_fails_without_calling() {
        let transport = Arc::new(RecordingTransport::default());
        let client = client_with(vec![], transport.clone(), Duration::from_secs(1)).await;

        let err = client.invoke("ClubAdmin.CreateNewClub", RpcRequest::new("corr".into())).await.unwrap_err();
        assert!(matches!(err, GatewayError::BackendUnavailable { .. }));
        assert!(transport.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_yields_timeout() {
        let transport = Arc::new(RecordingTransport {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let client = client_with(abc(), transport.clone(), Duration::from_secs(10)).await;

        let request = RpcRequest::new("corr".into()).with_deadline(Duration::from_millis(50));
        let err = client.invoke("ClubAdmin.CreateNewClub", request).await.unwrap_err();
        assert!(matches!(err, GatewayError::BackendTimeout { after, .. } if after == Duration::from_millis(50)));
        assert_eq!(transport.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failures_are_mapped_and_not_retried() {
        let transport = Arc::new(RecordingTransport {
            fail_with: Some(|address| TransportError::Unreachable {
                address: address.to_string(),
                reason: "connection refused".into(),
            }),
            ..Default::default()
        });
        let client = client_with(abc(), transport.clone(), Duration::from_secs(1)).await;
        let err = client.invoke("ClubAdmin.CreateNewClub", RpcRequest::new("corr".into())).await.unwrap_err();
        assert!(matches!(err, GatewayError::BackendUnavailable { .. }));
        assert_eq!(transport.calls.lock().len(), 1);

        let transport = Arc::new(RecordingTransport {
            fail_with: Some(|address| TransportError::Rejected {
                address: address.to_string(),
                reason: "status 400: bad uuid".into(),
            }),
            ..Default::default()
        });
        let client = client_with(abc(), transport, Duration::from_secs(1)).await;
        let err = client.invoke("ClubAdmin.CreateNewClub", RpcRequest::new("corr".into())).await.unwrap_err();
        assert!(matches!(err, GatewayError::BackendRejected { ref reason, .. } if reason.contains("bad uuid")));
    }

    #[tokio::test]
    async fn test_correlation_id_reaches_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let client = client_with(abc(), transport.clone(), Duration::from_secs(1)).await;
        client.invoke("ClubAdmin.CreateNewClub", RpcRequest::new("req-77".into())).await.unwrap();
        assert_eq!(transport.calls.lock()[0].2, "req-77");
        assert_eq!(transport.calls.lock()[0].1, "ClubAdmin.CreateNewClub");
    }
}
