//! Correlation id assignment.

use axum::extract::Request;
use axum::http::HeaderName;
use axum::middleware::Next;
use axum::response::Response;

use crate::observability::{CorrelationId, X_REQUEST_ID};

/// Reuse a well-formed inbound `x-request-id` or mint one, expose it to the
/// rest of the chain as a request extension, and echo it on the response.
pub async fn correlator(mut req: Request, next: Next) -> Response {
    let id = CorrelationId::from_headers(req.headers()).unwrap_or_else(CorrelationId::generate);
    let header = HeaderName::from_static(X_REQUEST_ID);

    req.headers_mut().insert(header.clone(), id.header_value());
    req.extensions_mut().insert(id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(header, id.header_value());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(id): Extension<CorrelationId>| async move { id.to_string() }),
            )
            .layer(axum::middleware::from_fn(correlator))
    }

    #[tokio::test]
    async fn test_inbound_id_is_reused_and_echoed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(X_REQUEST_ID, "trace-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "trace-42");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "trace-42".as_bytes());
    }

    #[tokio::test]
    async fn test_missing_id_is_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let echoed = response.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, echoed.as_bytes());
        assert_eq!(echoed.len(), 36);
    }
}
