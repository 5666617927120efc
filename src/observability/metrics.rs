//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, domain
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_envelope_rejections_total` (counter): envelope contract violations by reason
//! - `gateway_backend_calls_total` (counter): backend calls by service and outcome
//! - `gateway_backend_call_duration_seconds` (histogram)
//! - `gateway_registry_instances` (gauge): live instances per service
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::GatewayResult;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, domain: &str, start: Instant) {
    let status = status.to_string();
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status,
        "domain" => domain.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "domain" => domain.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_envelope_rejection(reason: &'static str) {
    counter!("gateway_envelope_rejections_total", "reason" => reason).increment(1);
}

pub fn record_backend_call(service: &str, outcome: &'static str, start: Instant) {
    counter!(
        "gateway_backend_calls_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_backend_call_duration_seconds", "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Outcome label of a backend call: `ok` or the error's kind.
pub fn backend_outcome<T>(result: &GatewayResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}

pub fn record_registry_size(service: &str, instances: usize) {
    gauge!("gateway_registry_instances", "service" => service.to_string()).set(instances as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use std::time::Duration;

    #[test]
    fn test_backend_outcome_follows_the_returned_error() {
        assert_eq!(backend_outcome(&Ok::<_, GatewayError>(())), "ok");
        let timeout: GatewayResult<()> = Err(GatewayError::BackendTimeout {
            service: "naver-open-api".into(),
            after: Duration::from_secs(1),
        });
        assert_eq!(backend_outcome(&timeout), "backend_timeout");
        let unavailable: GatewayResult<()> = Err(GatewayError::BackendUnavailable {
            service: "naver-open-api".into(),
        });
        assert_eq!(backend_outcome(&unavailable), "backend_unavailable");
    }
}
