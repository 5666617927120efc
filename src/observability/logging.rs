//! Process-wide structured logging and span export.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber once at startup
//! - Choose JSON or human-readable output
//! - Export spans to the tracing collector over OTLP
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Per-domain request logs go to their own sinks (see `domain_log`), this
//!   subscriber only carries process events and mirrored entries
//! - Spans are batched on the Tokio runtime; [`TelemetryGuard`] flushes them on drop

use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ObservabilityConfig, TracingConfig};

/// Failure to set up span export.
#[derive(Debug, thiserror::Error)]
#[error("unable to build span exporter for {endpoint}: {source}")]
pub struct TelemetryError {
    pub endpoint: String,
    #[source]
    pub source: TraceError,
}

/// Keeps the tracer provider alive; flushes pending spans when dropped.
#[must_use = "spans stop being exported once the guard is dropped"]
pub struct TelemetryGuard;

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        global::shutdown_tracer_provider();
    }
}

/// OTLP endpoint for a collector address given as `host:port` or a full URL.
pub fn collector_endpoint(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Install the global subscriber with span export to the collector.
///
/// Must run inside the Tokio runtime. If a subscriber is already installed
/// the new one is ignored but the exporter stays registered.
pub fn init_logging(
    config: &ObservabilityConfig,
    tracing_config: &TracingConfig,
) -> Result<TelemetryGuard, TelemetryError> {
    let endpoint = collector_endpoint(&tracing_config.collector_address);
    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint.clone())
        .build_span_exporter()
        .map_err(|source| TelemetryError {
            endpoint: endpoint.clone(),
            source,
        })?;

    let provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(sdktrace::Config::default().with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            tracing_config.service_name.clone(),
        )])))
        .build();
    global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(tracing_config.service_name.clone());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("api_gateway={},tower_http=info", config.log_level)));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_opentelemetry::layer().with_tracer(tracer));
    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    tracing::info!(
        collector = %endpoint,
        service = %tracing_config.service_name,
        "Span export configured"
    );
    Ok(TelemetryGuard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_endpoint_gets_a_scheme() {
        assert_eq!(collector_endpoint("jaeger:4317"), "http://jaeger:4317");
        assert_eq!(collector_endpoint(" jaeger:4317 "), "http://jaeger:4317");
        assert_eq!(collector_endpoint("https://otel.example:4317"), "https://otel.example:4317");
    }
}
