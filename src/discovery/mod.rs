//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     declared ServiceNames
//!     → backend.rs (Consul health query, one per service)
//!     → registry.rs (sorted, cached behind ArcSwap)
//!
//! Runtime:
//!     watch loop (blocking query) / webhook refresh
//!     → backend.rs
//!     → registry.rs (atomic list swap + MembershipChange broadcast)
//!
//! Per call:
//!     service client → registry.instances(name) → selection strategy
//! ```

pub mod backend;
pub mod instance;
pub mod registry;

pub use backend::{ConsulDiscovery, Discovery, DiscoveryError, StaticDiscovery};
pub use instance::{MembershipChange, Resolution, ServiceInstance, ServiceName};
pub use registry::ServiceRegistry;
