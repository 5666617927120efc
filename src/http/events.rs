//! Endpoints outside the middleware chain: health and discovery events.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, HeaderName};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::{codes, GatewayError};
use crate::http::server::AppState;

/// Highest discovery change index applied so far.
#[derive(Debug)]
pub struct ChangeIndex {
    header: HeaderName,
    applied: AtomicU64,
}

impl ChangeIndex {
    pub fn new(header: HeaderName) -> Self {
        Self {
            header,
            applied: AtomicU64::new(0),
        }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Whether a change at `index` has already been applied.
    pub fn is_applied(&self, index: u64) -> bool {
        self.applied.load(Ordering::Acquire) >= index
    }

    /// Record `index`; true if it is newer than everything seen before.
    pub fn advance(&self, index: u64) -> bool {
        self.applied.fetch_max(index, Ordering::AcqRel) < index
    }

    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Acquire)
    }
}

pub async fn ping() -> Json<&'static str> {
    Json("pong")
}

/// `POST /events/types/consul-change`: refresh the registry out of band.
pub async fn consul_change(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let header = state.change_index.header();
    let index = match headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().parse::<u64>())
    {
        Some(Ok(index)) => index,
        Some(Err(_)) => {
            return GatewayError::BadRequest(format!("{} header must be a number", header)).into_response()
        }
        None => return GatewayError::BadRequest(format!("missing {} header", header)).into_response(),
    };

    if state.change_index.is_applied(index) {
        tracing::debug!(index, applied = state.change_index.applied(), "Discovery change already applied");
        return Json(json!({
            "status": 200,
            "code": codes::SUCCESS,
            "message": "change index already applied",
            "index": index,
        }))
        .into_response();
    }

    tracing::info!(index, "Discovery change event received; refreshing registry");
    let mut refreshed = Vec::new();
    let mut failed = Vec::new();
    for (service, outcome) in state.registry.refresh_all().await {
        match outcome {
            Ok(change) => {
                if let Some(change) = change {
                    tracing::info!(
                        service = %change.service,
                        added = change.added.len(),
                        removed = change.removed.len(),
                        total = change.total,
                        "Service membership changed"
                    );
                }
                refreshed.push(service.to_string());
            }
            Err(e) => failed.push(json!({ "service": service.to_string(), "error": e.to_string() })),
        }
    }

    // Recorded only once at least one service refreshed.
    if !refreshed.is_empty() {
        state.change_index.advance(index);
    } else {
        tracing::warn!(index, failed = failed.len(), "No service refreshed; change index not recorded");
    }

    Json(json!({
        "status": 200,
        "code": codes::SUCCESS,
        "message": "registry refreshed",
        "index": index,
        "refreshed": refreshed,
        "failed": failed,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_index_only_advances() {
        let index = ChangeIndex::new(HeaderName::from_static("x-consul-index"));
        assert!(index.advance(5));
        assert!(!index.advance(5));
        assert!(!index.advance(3));
        assert!(index.advance(6));
        assert_eq!(index.applied(), 6);
        assert!(index.is_applied(6));
        assert!(index.is_applied(2));
        assert!(!index.is_applied(7));
    }
}
