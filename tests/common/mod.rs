//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use api_gateway::config::schema::Secret;
use api_gateway::discovery::{ServiceInstance, StaticDiscovery};
use api_gateway::lifecycle::{assemble, Gateway};
use api_gateway::rpc::HttpTransport;
use api_gateway::services::open_api::LocalSearchQuery;
use api_gateway::services::LocalSearch;
use api_gateway::{GatewayConfig, GatewayResult, StartupError};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const SECURITY_HEADER: &str = "Request-Security";
pub const SECURITY_VALUE: &str = "dms-test-client";

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub request_line: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// Start a programmable JSON backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(Captured) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(captured) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(captured).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Backend answering every call with `reply`.
pub async fn start_mock_backend(reply: Value) -> SocketAddr {
    start_programmable_backend(move |_| {
        let reply = reply.to_string();
        async move { (200, reply) }
    })
    .await
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<Captured> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null);
    Some(Captured {
        request_line,
        headers,
        body,
    })
}

/// Local search stub echoing the query.
pub struct StubSearch;

#[async_trait]
impl LocalSearch for StubSearch {
    async fn search_local(&self, query: LocalSearchQuery) -> GatewayResult<Value> {
        Ok(json!({ "total": 1, "items": [{ "title": query.query }] }))
    }
}

/// Configuration as the process would build it from a complete environment.
pub fn test_config(log_dir: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.discovery.address = "127.0.0.1:8500".into();
    config.discovery.watch_enabled = false;
    config.tracing.collector_address = "127.0.0.1:4317".into();
    config.open_api.client_id = "client-id".into();
    config.open_api.client_secret = Secret::new("client-secret");
    config.logging.directory = log_dir.display().to_string();
    config.security.allowed_values = vec![SECURITY_VALUE.into()];
    config.services.call_timeout_ms = 2_000;
    config
}

/// Static membership with every declared service present.
pub fn discovery_for(config: &GatewayConfig, overrides: Vec<(&str, Vec<ServiceInstance>)>) -> StaticDiscovery {
    let discovery = StaticDiscovery::new();
    for name in config.services.names() {
        discovery.set(name.as_str(), Vec::new());
    }
    for (name, instances) in overrides {
        discovery.set(name, instances);
    }
    discovery
}

pub async fn try_gateway(
    config: GatewayConfig,
    discovery: StaticDiscovery,
) -> Result<Gateway, StartupError> {
    assemble(
        config,
        Arc::new(discovery),
        Arc::new(HttpTransport::new().unwrap()),
        Arc::new(StubSearch),
    )
    .await
}

pub async fn gateway(config: GatewayConfig, discovery: StaticDiscovery) -> Gateway {
    try_gateway(config, discovery).await.unwrap()
}

pub fn instances(addrs: &[SocketAddr]) -> Vec<ServiceInstance> {
    addrs
        .iter()
        .enumerate()
        .map(|(i, addr)| ServiceInstance::new(format!("instance-{}", i), addr.to_string()))
        .collect()
}

/// Request builder with the security header already set.
pub fn secured(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(SECURITY_HEADER, SECURITY_VALUE)
}

/// Send one request through the router; returns status, headers and body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

pub async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(router, request).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

/// Read a domain log once it contains `needle`; entries are written in the background.
pub async fn read_log_until(path: &Path, needle: &str) -> String {
    for _ in 0..100 {
        let contents = std::fs::read_to_string(path).unwrap_or_default();
        if contents.contains(needle) {
            return contents;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("{} never contained {:?}", path.display(), needle);
}
