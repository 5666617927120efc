//! Dispatch of REST requests to route handlers.
//!
//! Runs innermost in the middleware chain: looks the route up, binds the
//! route group's domain log to the request, builds the backend call and
//! renders the handler's reply as an envelope.

use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::envelope::from_reply;
use crate::error::{GatewayError, GatewayResult};
use crate::http::routes::BodyRule;
use crate::http::server::AppState;
use crate::observability::{metrics, CorrelationId};
use crate::rpc::{RpcRequest, FORWARDED_METADATA};

pub async fn dispatch_handler(State(state): State<AppState>, req: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let Some(matched) = state.dispatcher.dispatch(&method, &path) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start);
        return GatewayError::RouteNotFound {
            method: method.to_string(),
            path,
        }
        .into_response();
    };
    let route = matched.route;
    let domain = route.domain;

    let correlation = parts
        .extensions
        .get::<CorrelationId>()
        .cloned()
        .unwrap_or_else(CorrelationId::generate);
    let log = state.logs.attach(domain, correlation.clone());

    let outcome = match build_request(&parts, body, route.handler.body, state.max_body_size, correlation).await {
        Ok(mut request) => {
            request.params = matched.params;
            (route.handler.call)(state.services.clone(), request).await
        }
        Err(e) => Err(e),
    };

    let mut response = match outcome {
        Ok(reply) => {
            let (status, envelope) = from_reply(reply);
            if let Some(log) = &log {
                log.info(
                    "request handled",
                    json!({
                        "method": method.as_str(),
                        "path": path,
                        "operation": route.handler.name,
                        "status": status.as_u16(),
                    }),
                );
            }
            (status, Json(envelope)).into_response()
        }
        Err(e) => {
            if let Some(log) = &log {
                log.warn(
                    "request failed",
                    json!({
                        "method": method.as_str(),
                        "path": path,
                        "operation": route.handler.name,
                        "status": e.status().as_u16(),
                        "error": e.to_string(),
                    }),
                );
            }
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), domain.as_str(), start);
    if let Some(log) = log {
        response.extensions_mut().insert(log);
    }
    response
}

async fn build_request(
    parts: &Parts,
    body: Body,
    rule: BodyRule,
    max_body_size: usize,
    correlation: CorrelationId,
) -> GatewayResult<RpcRequest> {
    let mut request = RpcRequest::new(correlation);

    if let Some(query) = parts.uri.query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            request.push_query(key, value);
        }
    }

    for name in FORWARDED_METADATA {
        if let Some(value) = parts.headers.get(name).and_then(|v| v.to_str().ok()) {
            request.metadata.insert(name.to_string(), value.to_string());
        }
    }

    if rule == BodyRule::Json {
        let bytes = axum::body::to_bytes(body, max_body_size)
            .await
            .map_err(|e| GatewayError::BadRequest(format!("unable to read request body: {}", e)))?;
        if bytes.is_empty() {
            return Err(GatewayError::BadRequest("request body is required".into()));
        }
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::BadRequest(format!("invalid JSON body: {}", e)))?;
        request.body = Some(value);
    }

    Ok(request)
}
