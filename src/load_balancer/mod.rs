//! Instance selection subsystem.
//!
//! # Data Flow
//! ```text
//! Service client call
//!     → registry (current sorted instance list)
//!     → Apply selection strategy:
//!         - round_robin.rs (rotate through instances, per service)
//!         - random.rs (uniform pick)
//!     → Return one instance, or None for an empty list
//! ```
//!
//! # Design Decisions
//! - Strategies never see an unsorted list; ordering is the registry's job
//! - An empty list is never "selected from": callers fail fast
//! - New strategies plug in without touching the service client

pub mod random;
pub mod round_robin;

use std::sync::Arc;

use crate::config::StrategyKind;
use crate::discovery::{ServiceInstance, ServiceName};

pub use random::Random;
pub use round_robin::RoundRobin;

/// Picks the instance that serves the next call to a service.
pub trait SelectionStrategy: Send + Sync + std::fmt::Debug {
    /// Returns `None` only when `instances` is empty.
    fn select<'a>(&self, service: &ServiceName, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance>;
}

/// Build the configured strategy.
pub fn strategy_for(kind: StrategyKind) -> Arc<dyn SelectionStrategy> {
    match kind {
        StrategyKind::RoundRobin => Arc::new(RoundRobin::new()),
        StrategyKind::Random => Arc::new(Random::new()),
    }
}
