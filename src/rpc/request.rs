//! Outbound call payloads.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{json, Map, Value};

use crate::observability::CorrelationId;

/// Inbound headers forwarded to backends as call metadata.
pub const FORWARDED_METADATA: [&str; 2] = ["authorization", "request-security"];

/// Everything a handler hands to one backend operation.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Path parameters, by pattern name.
    pub params: BTreeMap<String, String>,
    /// Query parameters; repeated keys become arrays.
    pub query: Map<String, Value>,
    /// Decoded JSON body, if the request had one.
    pub body: Option<Value>,
    /// Forwarded caller metadata (lower-case header names).
    pub metadata: BTreeMap<String, String>,
    pub correlation: CorrelationId,
    /// Overrides the client's default call deadline.
    pub deadline: Option<Duration>,
}

impl RpcRequest {
    pub fn new(correlation: CorrelationId) -> Self {
        Self {
            params: BTreeMap::new(),
            query: Map::new(),
            body: None,
            metadata: BTreeMap::new(),
            correlation,
            deadline: None,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Add one query pair, promoting the value to an array on repetition.
    pub fn push_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = Value::String(value.into());
        match self.query.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.query.insert(key, value);
            }
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Single-valued query lookup; the first value wins for repeated keys.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        match self.query.get(key)? {
            Value::String(s) => Some(s),
            Value::Array(values) => values.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Wire payload sent to the backend.
    pub fn payload(&self) -> Value {
        json!({
            "params": self.params,
            "query": self.query,
            "body": self.body,
        })
    }
}
