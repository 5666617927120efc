//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (overlay required environment variables)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed by value/reference to each component constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no component reads the environment later
//! - All fields have defaults to allow minimal configs
//! - Missing required environment is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{
    CorsConfig, DiscoveryConfig, ObservabilityConfig, OpenApiConfig, SecurityConfig, ServicesConfig,
    StrategyKind, TracingConfig,
};
