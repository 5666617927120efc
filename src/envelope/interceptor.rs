//! Response envelope interceptor.
//!
//! # Responsibilities
//! - Inspect the first data frame of every response body
//! - Force a 500 with no body when an envelope breaks its contract
//! - Keep the normalized envelope for logging
//!
//! # Design Decisions
//! - One writer per response; states move `Idle → Writing → Validated | Rejected`
//! - Frames after the first are never re-validated and always forwarded;
//!   only a rejected first frame is discarded
//! - Never panics on malformed input

use std::future::ready;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use futures_util::stream::{self, StreamExt};
use serde_json::json;

use crate::envelope::contract::{inspect, Envelope, EnvelopeViolation, Inspection};
use crate::observability::{metrics, RequestLog};

/// Why a writer stopped validating.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Body is outside the contract; passed through untouched.
    NotEnvelope,
    /// Body is an envelope that breaks the contract.
    Contract(EnvelopeViolation),
}

/// Per-response interception state.
#[derive(Debug, Clone, PartialEq)]
pub enum WriterState {
    Idle,
    Writing,
    Validated(Envelope),
    Rejected(Rejection),
}

/// What to do with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    Forward,
    /// Discard the frame and replace the status with 500.
    Fail,
}

/// Envelope state machine for one response.
#[derive(Debug)]
pub struct EnvelopeWriter {
    state: WriterState,
}

impl Default for EnvelopeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeWriter {
    pub fn new() -> Self {
        Self {
            state: WriterState::Idle,
        }
    }

    pub fn state(&self) -> &WriterState {
        &self.state
    }

    /// Feed one body frame.
    pub fn write(&mut self, frame: &[u8]) -> WriteDecision {
        match &self.state {
            WriterState::Idle => {}
            WriterState::Writing | WriterState::Validated(_) | WriterState::Rejected(_) => {
                return WriteDecision::Forward
            }
        }

        self.state = WriterState::Writing;
        let (state, decision) = match inspect(frame) {
            Inspection::Valid(envelope) => (WriterState::Validated(envelope), WriteDecision::Forward),
            Inspection::NotEnvelope => (WriterState::Rejected(Rejection::NotEnvelope), WriteDecision::Forward),
            Inspection::Invalid(violation) => (
                WriterState::Rejected(Rejection::Contract(violation)),
                WriteDecision::Fail,
            ),
        };
        self.state = state;
        decision
    }
}

/// Middleware validating the envelope of every response.
pub async fn envelope_interceptor(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let (mut parts, body) = response.into_parts();
    let request_log = parts.extensions.get::<RequestLog>().cloned();

    let mut frames = body.into_data_stream();
    let first = loop {
        match frames.next().await {
            Some(Ok(frame)) if frame.is_empty() => continue,
            other => break other,
        }
    };

    let frame = match first {
        // Nothing was ever written.
        None => return Response::from_parts(parts, Body::empty()),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Response body failed before its first frame");
            let rest = stream::once(ready(Err::<Bytes, _>(e))).chain(frames);
            return Response::from_parts(parts, Body::from_stream(rest));
        }
        Some(Ok(frame)) => frame,
    };

    let mut writer = EnvelopeWriter::new();
    match writer.write(&frame) {
        WriteDecision::Forward => {
            if let WriterState::Validated(envelope) = writer.state() {
                tracing::debug!(status = envelope.status, code = envelope.code, "Envelope validated");
            }
            let body = stream::once(ready(Ok(frame))).chain(frames);
            Response::from_parts(parts, Body::from_stream(body))
        }
        WriteDecision::Fail => {
            let WriterState::Rejected(Rejection::Contract(violation)) = writer.state() else {
                return Response::from_parts(parts, Body::from_stream(frames));
            };
            let payload = String::from_utf8_lossy(&frame);
            tracing::error!(
                violation = %violation,
                intended_status = parts.status.as_u16(),
                payload = %payload,
                "Handler response broke the envelope contract"
            );
            if let Some(log) = &request_log {
                log.error(
                    "response envelope rejected",
                    json!({
                        "violation": violation.to_string(),
                        "intended_status": parts.status.as_u16(),
                        "payload": payload,
                    }),
                );
            }
            metrics::record_envelope_rejection(violation.reason());

            parts.status = StatusCode::INTERNAL_SERVER_ERROR;
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.remove(header::CONTENT_TYPE);
            // The rejected frame is gone; anything written after it still goes out.
            Response::from_parts(parts, Body::from_stream(frames))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[test]
    fn test_writer_transitions() {
        let mut writer = EnvelopeWriter::new();
        assert_eq!(writer.state(), &WriterState::Idle);
        assert_eq!(writer.write(br#"{"status":200,"code":0,"message":"ok"}"#), WriteDecision::Forward);
        assert!(matches!(writer.state(), WriterState::Validated(e) if e.status == 200));
        // Second write is not re-validated.
        assert_eq!(writer.write(b"garbage"), WriteDecision::Forward);

        let mut writer = EnvelopeWriter::new();
        assert_eq!(writer.write(br#"{"code":0,"message":"ok"}"#), WriteDecision::Fail);
        assert_eq!(writer.write(br#"{"status":200,"code":0,"message":"ok"}"#), WriteDecision::Forward);
        assert!(matches!(writer.state(), WriterState::Rejected(Rejection::Contract(_))));

        let mut writer = EnvelopeWriter::new();
        assert_eq!(writer.write(b"plain text"), WriteDecision::Forward);
        assert_eq!(writer.state(), &WriterState::Rejected(Rejection::NotEnvelope));
    }

    async fn run(status: StatusCode, body: &'static str) -> (StatusCode, Bytes) {
        let app = Router::new()
            .route("/", get(move || async move { (status, body) }))
            .layer(axum::middleware::from_fn(envelope_interceptor));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes)
    }

    #[tokio::test]
    async fn test_valid_envelope_bytes_pass_unchanged() {
        let body = r#"{"status":201.0,"code":7,"message":"ok"}"#;
        let (status, bytes) = run(StatusCode::CREATED, body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(bytes, body.as_bytes());
    }

    #[tokio::test]
    async fn test_missing_field_forces_500_and_drops_body() {
        let (status, bytes) = run(StatusCode::OK, r#"{"code":0,"message":"ok"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_string_code_forces_500() {
        let (status, bytes) = run(StatusCode::OK, r#"{"status":200.0,"code":"0","message":"ok"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_non_envelopes_pass_through() {
        let (status, bytes) = run(StatusCode::ACCEPTED, "pong").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(bytes, "pong".as_bytes());

        let (status, bytes) = run(StatusCode::OK, "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, "{}".as_bytes());

        let (status, bytes) = run(StatusCode::NO_CONTENT, "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_later_frames_are_not_revalidated() {
        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    let chunks = vec![
                        Ok::<_, std::io::Error>(Bytes::from_static(br#"{"status":200,"code":0,"message":"ok"}"#)),
                        Ok(Bytes::from_static(b"\ntrailing")),
                    ];
                    Body::from_stream(stream::iter(chunks))
                }),
            )
            .layer(axum::middleware::from_fn(envelope_interceptor));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.ends_with(b"\ntrailing"));
    }

    #[tokio::test]
    async fn test_frames_after_a_rejected_first_frame_still_go_out() {
        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    let chunks = vec![
                        Ok::<_, std::io::Error>(Bytes::from_static(br#"{"code":0,"message":"ok"}"#)),
                        Ok(Bytes::from_static(br#"{"status":500,"code":-1,"message":"late"}"#)),
                    ];
                    Body::from_stream(stream::iter(chunks))
                }),
            )
            .layer(axum::middleware::from_fn(envelope_interceptor));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, br#"{"status":500,"code":-1,"message":"late"}"#.as_slice());
    }
}
