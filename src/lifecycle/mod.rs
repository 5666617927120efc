//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → domain log sinks → registry (one discovery query per service)
//!     → service clients → route table → HTTP server
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop accepting → drain in-flight requests
//!     → stop registry watchers → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup; any failure is fatal and nothing is served
//! - Listener binds last (traffic only when ready)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{assemble, bootstrap, Gateway};
