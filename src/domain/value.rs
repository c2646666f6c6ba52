//! Loosely typed input values and their bind-ready coerced form.

use serde_json::Value as JsonValue;

/// A record field as it arrived over the wire, narrowed to a closed set of variants.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Converts a JSON scalar. Arrays and objects keep their compact JSON text;
    /// integers outside `i64` are carried as floats.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => FieldValue::Null,
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else {
                    // u64 beyond i64::MAX or a real float
                    n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null)
                }
            }
            JsonValue::String(s) => FieldValue::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => FieldValue::Text(value.to_string()),
        }
    }
}

/// A coerced column value, typed so the store can bind typed NULLs.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Float(Option<f64>),
    /// Date/time text forwarded as-is; the store casts it on insert.
    Date(Option<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_narrows_scalars() {
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from_json(&json!(true)), FieldValue::Bool(true));
        assert_eq!(FieldValue::from_json(&json!(42)), FieldValue::Integer(42));
        assert_eq!(FieldValue::from_json(&json!(3.5)), FieldValue::Float(3.5));
        assert_eq!(
            FieldValue::from_json(&json!("x")),
            FieldValue::Text("x".to_string())
        );
    }

    #[test]
    fn from_json_keeps_nested_values_as_text() {
        assert_eq!(
            FieldValue::from_json(&json!({"a": 1})),
            FieldValue::Text("{\"a\":1}".to_string())
        );
        assert_eq!(
            FieldValue::from_json(&json!([1, 2])),
            FieldValue::Text("[1,2]".to_string())
        );
    }

    #[test]
    fn huge_unsigned_becomes_float() {
        assert_eq!(
            FieldValue::from_json(&json!(u64::MAX)),
            FieldValue::Float(u64::MAX as f64)
        );
    }
}
