//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! correlator middleware
//!     → correlation.rs (CorrelationId per request)
//!     → domain_log.rs (per-domain JSON-lines sinks, tagged with the id)
//!     → logging.rs (process log via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//! ```
//!
//! # Design Decisions
//! - Correlation id flows through logs, backend spans and backend metadata
//! - Domain sinks are opened once; failure to open one is fatal at startup
//! - Metrics are cheap (no-op without a recorder)

pub mod correlation;
pub mod domain_log;
pub mod logging;
pub mod metrics;

pub use correlation::{CorrelationId, X_REQUEST_ID};
pub use domain_log::{DomainLogger, DomainLogs, LogSinkError, RequestLog};
