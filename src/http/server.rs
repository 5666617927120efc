//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: fixed endpoints plus the dispatched REST surface
//! - Wire up the middleware chain in its fixed order
//! - Bind server to listener and drain on shutdown
//!
//! # Layout
//! ```text
//! /ping, /events/types/consul-change   (no chain)
//! everything else → timeout → cors → security → correlator → envelope → dispatch
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::InvalidHeaderName;
use axum::http::{HeaderName, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::discovery::ServiceRegistry;
use crate::envelope::envelope_interceptor;
use crate::http::dispatch::dispatch_handler;
use crate::http::events::{consul_change, ping, ChangeIndex};
use crate::http::middleware::{correlator, cors_layer, security_filter, SecurityPolicy};
use crate::http::routes::RouteHandler;
use crate::lifecycle::Shutdown;
use crate::observability::DomainLogs;
use crate::routing::Dispatcher;
use crate::services::Services;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<RouteHandler>>,
    pub services: Arc<Services>,
    pub registry: Arc<ServiceRegistry>,
    pub logs: DomainLogs,
    pub change_index: Arc<ChangeIndex>,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(
        config: &GatewayConfig,
        dispatcher: Dispatcher<RouteHandler>,
        services: Services,
        registry: Arc<ServiceRegistry>,
        logs: DomainLogs,
    ) -> Result<Self, InvalidHeaderName> {
        let index_header = HeaderName::try_from(config.discovery.index_header.as_str())?;
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            services: Arc::new(services),
            registry,
            logs,
            change_index: Arc::new(ChangeIndex::new(index_header)),
            max_body_size: config.security.max_body_size,
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, state: AppState) -> Result<Self, InvalidHeaderName> {
        let router = Self::build_router(config, state)?;
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Result<Router, InvalidHeaderName> {
        let policy = SecurityPolicy::from_config(&config.security)?;

        let api = Router::new().fallback(dispatch_handler).with_state(state.clone()).layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.timeouts.request_secs),
                ))
                .layer(cors_layer(&config.cors))
                .layer(axum::middleware::from_fn_with_state(policy, security_filter))
                .layer(axum::middleware::from_fn(correlator))
                .layer(axum::middleware::from_fn(envelope_interceptor)),
        );

        Ok(Router::new()
            .route("/ping", get(ping))
            .route("/events/types/consul-change", post(consul_change))
            .with_state(state)
            .fallback_service(api)
            .layer(TraceLayer::new_for_http()))
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
