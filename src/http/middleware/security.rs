//! Security header filter.
//!
//! Rejects requests whose security header is missing or malformed before
//! they reach any handler. Rejections are ordinary 403 envelopes.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::InvalidHeaderName;
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::SecurityConfig;
use crate::error::GatewayError;

const MAX_VALUE_LEN: usize = 256;

/// Compiled security filter settings.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    enabled: bool,
    header: HeaderName,
    allowed: Arc<HashSet<String>>,
}

impl SecurityPolicy {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            enabled: config.enabled,
            header: HeaderName::try_from(config.header.as_str())?,
            allowed: Arc::new(config.allowed_values.iter().cloned().collect()),
        })
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        if !self.enabled {
            return Ok(());
        }

        let Some(raw) = headers.get(&self.header) else {
            return Err(GatewayError::Forbidden(format!("missing {} header", self.header)));
        };
        let bytes = raw.as_bytes();
        let well_formed = !bytes.is_empty()
            && bytes.len() <= MAX_VALUE_LEN
            && bytes.iter().all(|b| b.is_ascii_graphic());
        if !well_formed {
            return Err(GatewayError::Forbidden(format!("malformed {} header", self.header)));
        }

        // Visible ASCII is valid UTF-8.
        let value = std::str::from_utf8(bytes).unwrap_or_default();
        if !self.allowed.is_empty() && !self.allowed.contains(value) {
            return Err(GatewayError::Forbidden(format!("{} header not accepted", self.header)));
        }
        Ok(())
    }
}

pub async fn security_filter(State(policy): State<SecurityPolicy>, req: Request, next: Next) -> Response {
    if let Err(rejection) = policy.check(req.headers()) {
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            reason = %rejection,
            "Request rejected by security filter"
        );
        return rejection.into_response();
    }
    next.run(req).await
}
