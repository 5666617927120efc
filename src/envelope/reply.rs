//! Backend reply to envelope conversion.

use axum::http::StatusCode;
use serde_json::{Map, Value};

use crate::envelope::numeric::Numeric;
use crate::error::codes;

const DEFAULT_MESSAGE: &str = "success";

/// Turn a backend reply into the envelope body and HTTP status to send.
///
/// Object replies keep all their fields; `msg` stands in for a missing
/// `message`, and absent `status`/`code`/`message` get success defaults.
/// Any other reply is wrapped under `data`. The HTTP status follows a numeric
/// `status` when it is a valid status code and is 200 otherwise.
///
/// Fields that are present keep their original value even when mistyped; the
/// interceptor is the one that judges them.
pub fn from_reply(reply: Value) -> (StatusCode, Value) {
    let mut object = match reply {
        Value::Object(object) => object,
        Value::Null => Map::new(),
        other => {
            let mut object = Map::new();
            object.insert("data".into(), other);
            object
        }
    };

    if !object.contains_key("message") {
        if let Some(msg) = object.remove("msg") {
            object.insert("message".into(), msg);
        }
    }
    object
        .entry("status")
        .or_insert_with(|| Value::from(StatusCode::OK.as_u16()));
    object.entry("code").or_insert_with(|| Value::from(codes::SUCCESS));
    object
        .entry("message")
        .or_insert_with(|| Value::from(DEFAULT_MESSAGE));

    let status = object
        .get("status")
        .and_then(|v| Numeric::from_value(v).ok())
        .map(Numeric::to_integer)
        .and_then(|v| u16::try_from(v).ok())
        .and_then(|v| StatusCode::from_u16(v).ok())
        .unwrap_or(StatusCode::OK);

    (status, Value::Object(object))
}
