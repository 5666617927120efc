//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Look up the first route matching method and path
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc`, no locks)
//! - O(n) scan; the table is a few dozen routes
//! - Generic over the handler so the table can be inspected offline

use axum::http::Method;

use crate::domain::Domain;
use crate::routing::matcher::{PathParams, PathPattern, PatternError};

/// One registered route.
#[derive(Debug, Clone)]
pub struct Route<H> {
    pub method: Method,
    pub pattern: PathPattern,
    /// Route group; selects the domain log sink.
    pub domain: Domain,
    pub handler: H,
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    pub params: PathParams,
}

/// Ordered route table.
#[derive(Debug, Clone)]
pub struct Dispatcher<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Dispatcher<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> Dispatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Earlier registrations take precedence.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        domain: Domain,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        let pattern = PathPattern::parse(pattern)?;
        self.routes.push(Route {
            method,
            pattern,
            domain,
            handler,
        });
        Ok(self)
    }

    pub fn dispatch(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, H>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route
                    .pattern
                    .matches(path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    /// True if some route matches `path` under any method.
    pub fn matches_any_method(&self, path: &str) -> bool {
        self.routes.iter().any(|route| route.pattern.matches(path).is_some())
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
