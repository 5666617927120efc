//! Envelope parsing and validation.

use serde_json::{Map, Value};

use crate::envelope::numeric::{JsonKind, Numeric};

/// Fields every envelope must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 3] = ["status", "code", "message"];

/// A validated, normalized envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: i64,
    pub code: i64,
    pub message: String,
    /// Domain fields beside the required three.
    pub extra: Map<String, Value>,
}

/// A body that is an envelope but breaks its contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeViolation {
    #[error("envelope is missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("envelope field `{field}` must be numeric, found {found}")]
    NotNumeric { field: &'static str, found: JsonKind },

    #[error("envelope field `{field}` must be a string, found {found}")]
    NotString { field: &'static str, found: JsonKind },
}

impl EnvelopeViolation {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            EnvelopeViolation::MissingField { .. } => "missing_field",
            EnvelopeViolation::NotNumeric { .. } => "not_numeric",
            EnvelopeViolation::NotString { .. } => "not_string",
        }
    }
}

/// Outcome of inspecting one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Inspection {
    /// Not a JSON object, or an empty one: outside the contract.
    NotEnvelope,
    Valid(Envelope),
    Invalid(EnvelopeViolation),
}

/// Parse `payload` and check it against the envelope contract.
pub fn inspect(payload: &[u8]) -> Inspection {
    let mut object = match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(object)) if !object.is_empty() => object,
        _ => return Inspection::NotEnvelope,
    };

    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Inspection::Invalid(EnvelopeViolation::MissingField { field: *field });
    }

    let status = match integer_field(&object, "status") {
        Ok(v) => v,
        Err(violation) => return Inspection::Invalid(violation),
    };
    let code = match integer_field(&object, "code") {
        Ok(v) => v,
        Err(violation) => return Inspection::Invalid(violation),
    };
    let message = match object.remove("message") {
        Some(Value::String(s)) => s,
        Some(other) => {
            return Inspection::Invalid(EnvelopeViolation::NotString {
                field: "message",
                found: JsonKind::of(&other),
            })
        }
        None => return Inspection::Invalid(EnvelopeViolation::MissingField { field: "message" }),
    };

    object.remove("status");
    object.remove("code");
    Inspection::Valid(Envelope {
        status,
        code,
        message,
        extra: object,
    })
}

fn integer_field(object: &Map<String, Value>, field: &'static str) -> Result<i64, EnvelopeViolation> {
    let value = object
        .get(field)
        .ok_or(EnvelopeViolation::MissingField { field })?;
    Numeric::from_value(value)
        .map(Numeric::to_integer)
        .map_err(|found| EnvelopeViolation::NotNumeric { field, found })
}
