//! External open-api backend (Naver local search).
//!
//! Unlike the other domains this one is not discovered: the gateway calls the
//! public API directly with the configured client credentials.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::config::OpenApiConfig;
use crate::config::schema::Secret;
use crate::discovery::ServiceName;
use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;

const SERVICE: &str = "naver-open-api";
const LOCAL_SEARCH_PATH: &str = "/v1/search/local.json";

/// Parameters of a local search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSearchQuery {
    pub query: String,
    pub display: Option<u32>,
    pub start: Option<u32>,
    pub sort: Option<String>,
}

impl LocalSearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            display: None,
            start: None,
            sort: None,
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("query", self.query.clone())];
        if let Some(display) = self.display {
            pairs.push(("display", display.to_string()));
        }
        if let Some(start) = self.start {
            pairs.push(("start", start.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        pairs
    }
}

#[async_trait]
pub trait LocalSearch: Send + Sync {
    /// Run one search and return the provider's JSON reply.
    async fn search_local(&self, query: LocalSearchQuery) -> GatewayResult<Value>;
}

/// [`LocalSearch`] against the Naver open API.
#[derive(Debug, Clone)]
pub struct NaverLocalSearch {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: Secret,
    timeout: Duration,
}

impl NaverLocalSearch {
    pub fn new(config: &OpenApiConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            timeout,
        })
    }

    fn service() -> ServiceName {
        ServiceName::new(SERVICE)
    }
}

#[async_trait]
impl LocalSearch for NaverLocalSearch {
    async fn search_local(&self, query: LocalSearchQuery) -> GatewayResult<Value> {
        let start = Instant::now();
        let result = self.fetch(&query).await;
        metrics::record_backend_call(SERVICE, metrics::backend_outcome(&result), start);
        result
    }
}

impl NaverLocalSearch {
    async fn fetch(&self, query: &LocalSearchQuery) -> GatewayResult<Value> {
        let url = format!("{}{}", self.base_url, LOCAL_SEARCH_PATH);

        let response = self
            .client
            .get(url)
            .query(&query.pairs())
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", self.client_secret.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::BackendRejected {
                service: Self::service(),
                reason: format!("status {}: {}", status.as_u16(), detail.trim()),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                GatewayError::BackendRejected {
                    service: Self::service(),
                    reason: format!("undecodable reply: {}", e),
                }
            }
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::BackendTimeout {
                service: Self::service(),
                after: self.timeout,
            }
        } else {
            tracing::warn!(error = %e, "Open API unreachable");
            GatewayError::BackendUnavailable {
                service: Self::service(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(base_url: String) -> OpenApiConfig {
        OpenApiConfig {
            base_url,
            client_id: "id-1".into(),
            client_secret: Secret::new("secret-1"),
            timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn test_sends_credentials_and_query() {
        let router = Router::new().route(
            LOCAL_SEARCH_PATH,
            get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "id": headers.get("x-naver-client-id").and_then(|v| v.to_str().ok()),
                    "secret": headers.get("x-naver-client-secret").and_then(|v| v.to_str().ok()),
                    "query": q.get("query"),
                    "display": q.get("display"),
                }))
            }),
        );
        let search = NaverLocalSearch::new(&config(serve(router).await)).unwrap();

        let mut query = LocalSearchQuery::new("대덕소프트웨어마이스터고");
        query.display = Some(5);
        let reply = search.search_local(query).await.unwrap();

        assert_eq!(reply["id"], "id-1");
        assert_eq!(reply["secret"], "secret-1");
        assert_eq!(reply["query"], "대덕소프트웨어마이스터고");
        assert_eq!(reply["display"], "5");
    }

    #[tokio::test]
    async fn test_error_status_is_rejection() {
        let router = Router::new().route(
            LOCAL_SEARCH_PATH,
            get(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad credentials") }),
        );
        let search = NaverLocalSearch::new(&config(serve(router).await)).unwrap();
        let err = search.search_local(LocalSearchQuery::new("x")).await.unwrap_err();
        assert!(matches!(err, GatewayError::BackendRejected { ref reason, .. } if reason.contains("401")));
    }

    #[tokio::test]
    async fn test_slow_provider_is_a_timeout() {
        let router = Router::new().route(
            LOCAL_SEARCH_PATH,
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({ "items": [] }))
            }),
        );
        let mut config = config(serve(router).await);
        config.timeout_secs = 1;
        let search = NaverLocalSearch::new(&config).unwrap();

        let result = search.search_local(LocalSearchQuery::new("x")).await;
        assert_eq!(metrics::backend_outcome(&result), "backend_timeout");
        assert!(matches!(result, Err(GatewayError::BackendTimeout { .. })));
    }
}
