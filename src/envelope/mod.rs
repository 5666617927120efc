//! Response envelope contract.
//!
//! # Data Flow
//! ```text
//! handler reply (backend JSON)
//!     → reply.rs (fill defaults, pick HTTP status)
//!     → response body bytes
//!     → interceptor.rs (first data frame)
//!         → contract.rs (parse, check fields, coerce numerics)
//!         → pass through unchanged, or force 500 with no body
//! ```
//!
//! # Design Decisions
//! - Numeric coercion is a pure function over a closed set of representations
//! - The normalized envelope is kept for logging only; bytes on the wire are
//!   the handler's original bytes
//! - Bodies that are not JSON objects (or are `{}`) opt out of the contract

pub mod contract;
pub mod interceptor;
pub mod numeric;
pub mod reply;

pub use contract::{inspect, Envelope, EnvelopeViolation, Inspection, REQUIRED_FIELDS};
pub use interceptor::{envelope_interceptor, EnvelopeWriter, Rejection, WriteDecision, WriterState};
pub use numeric::{JsonKind, Numeric};
pub use reply::from_reply;
