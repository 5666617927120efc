//! Gateway error taxonomy.
//!
//! - [`GatewayError`]: routine, client-visible request outcomes. Always
//!   rendered as a valid envelope.
//! - [`StartupError`]: anything that stops the process before it serves traffic.
//!
//! Envelope contract violations are not errors of this kind; they are
//! handled inside the envelope interceptor.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use crate::discovery::{DiscoveryError, ServiceName};
use crate::observability::LogSinkError;
use crate::routing::PatternError;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Envelope `code` values produced by the gateway itself.
pub mod codes {
    pub const SUCCESS: i64 = 0;
    pub const BAD_REQUEST: i64 = -400;
    pub const FORBIDDEN: i64 = -403;
    pub const ROUTE_NOT_FOUND: i64 = -404;
    pub const BACKEND_REJECTED: i64 = -502;
    pub const BACKEND_UNAVAILABLE: i64 = -503;
    pub const BACKEND_TIMEOUT: i64 = -504;
}

/// Request-path failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No live instance could be selected, or none could be reached.
    #[error("service {service} is unavailable")]
    BackendUnavailable { service: ServiceName },

    /// The backend did not answer within the call deadline.
    #[error("service {service} did not answer within {after:?}")]
    BackendTimeout { service: ServiceName, after: Duration },

    /// The backend answered, but with an error or an unusable reply.
    #[error("service {service} rejected the call: {reason}")]
    BackendRejected { service: ServiceName, reason: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::BackendTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::BackendRejected { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            GatewayError::BackendUnavailable { .. } => codes::BACKEND_UNAVAILABLE,
            GatewayError::BackendTimeout { .. } => codes::BACKEND_TIMEOUT,
            GatewayError::BackendRejected { .. } => codes::BACKEND_REJECTED,
            GatewayError::BadRequest(_) => codes::BAD_REQUEST,
            GatewayError::Forbidden(_) => codes::FORBIDDEN,
            GatewayError::RouteNotFound { .. } => codes::ROUTE_NOT_FOUND,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::BackendUnavailable { .. } => "backend_unavailable",
            GatewayError::BackendTimeout { .. } => "backend_timeout",
            GatewayError::BackendRejected { .. } => "backend_rejected",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::Forbidden(_) => "forbidden",
            GatewayError::RouteNotFound { .. } => "route_not_found",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "status": status.as_u16(),
            "code": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Anything that prevents the gateway from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("unable to connect discovery backend: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    LogSink(#[from] LogSinkError),

    #[error("unable to build outbound client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid route table: {0}")]
    Routes(#[from] PatternError),

    #[error("invalid header name in configuration: {0}")]
    HeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("unable to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_renders_envelope() {
        let err = GatewayError::BackendUnavailable {
            service: "DMS.SMS.v1.service.club".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 503);
        assert_eq!(body["code"], codes::BACKEND_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("club"));
    }
}
