//! Outbound RPC subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → capability trait method (services module)
//!     → client.rs (registry lookup, strategy pick, deadline)
//!     → transport.rs (one HTTP call to one instance)
//!     → reply JSON or GatewayError
//! ```

pub mod client;
pub mod request;
pub mod transport;

pub use client::ServiceClient;
pub use request::{RpcRequest, FORWARDED_METADATA};
pub use transport::{HttpTransport, RpcTransport, TransportError};
