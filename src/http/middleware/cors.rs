//! Cross-origin policy.

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Headers every origin may send, before configured extras.
const DEFAULT_HEADERS: [HeaderName; 3] = [header::ORIGIN, header::CONTENT_LENGTH, header::CONTENT_TYPE];

const METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Build the CORS stage. Entries that are not valid header names or values
/// are skipped with a warning; validation normally catches them first.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut headers = DEFAULT_HEADERS.to_vec();
    for name in &config.extra_headers {
        match HeaderName::try_from(name.as_str()) {
            Ok(name) => {
                if !headers.contains(&name) {
                    headers.push(name);
                }
            }
            Err(_) => tracing::warn!(header = %name, "Ignoring invalid CORS header name"),
        }
    }

    let origins = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(config.allowed_origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(METHODS.to_vec())
        .allow_headers(headers)
        .expose_headers([HeaderName::from_static(crate::observability::X_REQUEST_ID)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_preflight_allows_security_headers() {
        let app = Router::new()
            .route("/v1/clubs", get(|| async { "unreachable" }))
            .layer(cors_layer(&CorsConfig::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/v1/clubs")
                    .header(header::ORIGIN, "https://dms.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,request-security")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let allowed = response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("authorization"));
        assert!(allowed.contains("request-security"));
    }
}
