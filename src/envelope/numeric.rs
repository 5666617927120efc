//! Numeric-like JSON values.

use std::fmt;

use serde_json::{Number, Value};

/// Shape of a JSON value, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        })
    }
}

/// Every numeric representation an envelope field may arrive in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Numeric {
    pub fn from_number(number: &Number) -> Self {
        if let Some(v) = number.as_i64() {
            Numeric::Signed(v)
        } else if let Some(v) = number.as_u64() {
            Numeric::Unsigned(v)
        } else {
            // serde_json numbers are always one of the three.
            Numeric::Float(number.as_f64().unwrap_or_default())
        }
    }

    /// Classify `value`; anything but a JSON number is refused with its kind.
    pub fn from_value(value: &Value) -> Result<Self, JsonKind> {
        match value {
            Value::Number(n) => Ok(Self::from_number(n)),
            other => Err(JsonKind::of(other)),
        }
    }

    /// Plain integer form. Floats truncate toward zero; anything outside the
    /// `i64` range saturates.
    pub fn to_integer(self) -> i64 {
        match self {
            Numeric::Signed(v) => v,
            Numeric::Unsigned(v) => i64::try_from(v).unwrap_or(i64::MAX),
            // `as` saturates and maps NaN to 0.
            Numeric::Float(v) => v as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_representations() {
        assert_eq!(Numeric::from_value(&json!(200)).unwrap().to_integer(), 200);
        assert_eq!(Numeric::from_value(&json!(-7)).unwrap().to_integer(), -7);
        assert_eq!(Numeric::from_value(&json!(u64::MAX)).unwrap(), Numeric::Unsigned(u64::MAX));
        assert_eq!(Numeric::Unsigned(u64::MAX).to_integer(), i64::MAX);
    }

    #[test]
    fn test_floats_truncate_and_saturate() {
        assert_eq!(Numeric::from_value(&json!(200.0)).unwrap().to_integer(), 200);
        assert_eq!(Numeric::from_value(&json!(-3.9)).unwrap().to_integer(), -3);
        assert_eq!(Numeric::from_value(&json!(1e300)).unwrap().to_integer(), i64::MAX);
        assert_eq!(Numeric::from_value(&json!(-1e300)).unwrap().to_integer(), i64::MIN);
    }

    #[test]
    fn test_non_numbers_are_refused_with_their_kind() {
        assert_eq!(Numeric::from_value(&json!("0")), Err(JsonKind::String));
        assert_eq!(Numeric::from_value(&json!(true)), Err(JsonKind::Bool));
        assert_eq!(Numeric::from_value(&json!(null)), Err(JsonKind::Null));
        assert_eq!(Numeric::from_value(&json!([1])), Err(JsonKind::Array));
    }
}
