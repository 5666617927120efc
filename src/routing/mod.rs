//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     (method, pattern, domain, handler)
//!     → matcher.rs (compile pattern into literal / parameter segments)
//!     → router.rs (append in registration order, freeze)
//!
//! Incoming Request (method, path)
//!     → router.rs (scan routes whose method matches)
//!     → matcher.rs (segment-wise match, collect parameters)
//!     → Return: RouteMatch or None
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - No regex: parameters capture exactly one non-empty segment
//! - Deterministic: first registered match wins

pub mod matcher;
pub mod router;

pub use matcher::{PathParams, PathPattern, PatternError};
pub use router::{Dispatcher, Route, RouteMatch};
