//! Startup orchestration.
//!
//! # Responsibilities
//! - Open every domain log sink
//! - Resolve every declared service once
//! - Build service clients, facades and the route table
//! - Bind the listener and run until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Collaborators with network side effects are injected through
//!   [`assemble`] so tests can run the whole gateway in process

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::discovery::{ConsulDiscovery, Discovery, ServiceName, ServiceRegistry};
use crate::error::StartupError;
use crate::http::{build_dispatcher, AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::load_balancer::strategy_for;
use crate::observability::DomainLogs;
use crate::rpc::{HttpTransport, RpcTransport, ServiceClient};
use crate::services::{LocalSearch, NaverLocalSearch, ServiceClients, Services};

/// A fully assembled gateway, ready to serve.
pub struct Gateway {
    config: GatewayConfig,
    registry: Arc<ServiceRegistry>,
    server: HttpServer,
    shutdown: Shutdown,
}

/// Build the gateway from production collaborators.
pub async fn bootstrap(config: GatewayConfig) -> Result<Gateway, StartupError> {
    let discovery = ConsulDiscovery::new(
        &config.discovery.address,
        Duration::from_secs(config.discovery.watch_wait_secs),
        Duration::from_secs(config.discovery.query_timeout_secs),
    )?;
    let transport = HttpTransport::new().map_err(StartupError::Client)?;
    let open_api = NaverLocalSearch::new(&config.open_api).map_err(StartupError::Client)?;

    assemble(config, Arc::new(discovery), Arc::new(transport), Arc::new(open_api)).await
}

/// Build the gateway from the given collaborators.
pub async fn assemble(
    config: GatewayConfig,
    discovery: Arc<dyn Discovery>,
    transport: Arc<dyn RpcTransport>,
    open_api: Arc<dyn LocalSearch>,
) -> Result<Gateway, StartupError> {
    let logs = DomainLogs::open(Path::new(&config.logging.directory))?;
    tracing::info!(directory = %config.logging.directory, "Domain log sinks opened");

    let names: Vec<ServiceName> = config.services.names().iter().map(ServiceName::new).collect();
    let registry = Arc::new(ServiceRegistry::connect(discovery, names).await?);

    let strategy = strategy_for(config.services.strategy);
    let timeout = Duration::from_millis(config.services.call_timeout_ms);
    let client = |name: &str| {
        Arc::new(ServiceClient::new(
            ServiceName::new(name),
            registry.clone(),
            strategy.clone(),
            transport.clone(),
            timeout,
        ))
    };
    let clients = ServiceClients {
        auth: client(&config.services.auth),
        club: client(&config.services.club),
        outing: client(&config.services.outing),
        schedule: client(&config.services.schedule),
        announcement: client(&config.services.announcement),
    };
    let services = Services::connect(clients, open_api);

    let dispatcher = build_dispatcher()?;
    tracing::info!(routes = dispatcher.len(), strategy = ?config.services.strategy, "Route table compiled");

    let state = AppState::new(&config, dispatcher, services, registry.clone(), logs)?;
    let server = HttpServer::new(&config, state)?;

    Ok(Gateway {
        config,
        registry,
        server,
        shutdown: Shutdown::new(),
    })
}

impl Gateway {
    pub fn router(&self) -> Router {
        self.server.router()
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Bind the configured listener and serve until SIGINT/SIGTERM.
    pub async fn run(self) -> Result<(), StartupError> {
        let listener = TcpListener::bind(&self.config.listener.bind_address)
            .await
            .map_err(StartupError::Bind)?;
        spawn_signal_handler(self.shutdown.clone());
        self.serve(listener).await
    }

    /// Serve on `listener` until the shutdown handle fires.
    pub async fn serve(self, listener: TcpListener) -> Result<(), StartupError> {
        let watchers = if self.config.discovery.watch_enabled {
            self.registry.spawn_watchers(&self.shutdown)
        } else {
            Vec::new()
        };

        let result = self.server.run(listener, &self.shutdown).await;
        self.shutdown.trigger();
        for watcher in watchers {
            let _ = watcher.await;
        }

        result.map_err(StartupError::Serve)
    }
}
