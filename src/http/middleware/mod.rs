//! Request middleware chain.
//!
//! Fixed order, outermost first:
//! ```text
//! cors.rs        → may answer pre-flight itself
//! security.rs    → may reject with a 403 envelope
//! correlation.rs → always passes through
//! (domain log attach happens once the dispatcher knows the route group)
//! ```

pub mod correlation;
pub mod cors;
pub mod security;

pub use correlation::correlator;
pub use cors::cors_layer;
pub use security::{security_filter, SecurityPolicy};
