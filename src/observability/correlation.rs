//! Per-request correlation identifiers.
//!
//! A correlation id lives exactly as long as one inbound request. It is
//! attached to every domain log entry, to the span of every backend call and
//! to the `x-request-id` metadata sent to backends.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use uuid::Uuid;

/// Header carrying the correlation id in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

const MAX_INBOUND_LEN: usize = 128;

/// Identifier shared by everything done on behalf of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Generate a fresh UUID v4 based id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Reuse a caller-supplied id if it is present and well formed.
    ///
    /// Well formed means non-empty, at most 128 bytes, and made only of ASCII
    /// alphanumerics, `-`, `_` and `.`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(X_REQUEST_ID)?.to_str().ok()?;
        let valid = !raw.is_empty()
            && raw.len() <= MAX_INBOUND_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        valid.then(|| Self(raw.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header value form of the id.
    pub fn header_value(&self) -> HeaderValue {
        // Generated ids are UUIDs and inbound ids were validated as ASCII.
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static("invalid"))
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}
