//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, fixed endpoints)
//!     → middleware/ (cors → security → correlator)
//!     → envelope interceptor
//!     → dispatch.rs (route lookup, domain log attach, backend call)
//!     → routes.rs (one capability method per route)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod events;
pub mod middleware;
pub mod routes;
pub mod server;

pub use routes::{build_dispatcher, BodyRule, RouteHandler};
pub use server::{AppState, HttpServer};
