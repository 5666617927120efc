//! DMS API gateway library.
//!
//! Terminates the public REST surface, resolves each backend call through
//! discovery-backed, load-balanced service clients, and holds every handler
//! to one response envelope contract.

// Core subsystems
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod routing;

// Backend access
pub mod discovery;
pub mod load_balancer;
pub mod rpc;
pub mod services;

// Cross-cutting concerns
pub mod envelope;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use domain::Domain;
pub use error::{GatewayError, GatewayResult, StartupError};
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown};
