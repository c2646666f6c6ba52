//! Shape checks for the sync request body.
//!
//! The body is decoded into a plain JSON value first so the credential can be
//! checked before anything else about the payload is looked at.

use crate::app::SyncError;
use crate::domain::{Record, SyncRequest};
use serde_json::Value as JsonValue;

/// Decodes the raw body. Anything that is not JSON yields `Null`, which carries no credential.
pub fn decode_body(body: &[u8]) -> JsonValue {
    serde_json::from_slice(body).unwrap_or(JsonValue::Null)
}

/// The `apiKey` field, if present and a string.
pub fn credential(body: &JsonValue) -> Option<&str> {
    body.get("apiKey").and_then(JsonValue::as_str)
}

/// Requires `data` to be an array and builds the request from it.
///
/// `tableName` and `truncateFirst` of the wrong type are treated as absent.
pub fn parse_sync_payload(body: &JsonValue) -> Result<SyncRequest, SyncError> {
    let data = match body.get("data") {
        Some(JsonValue::Array(items)) => items,
        Some(other) => {
            return Err(SyncError::Validation(format!(
                "'data' must be an array, got {}",
                json_kind(other)
            )))
        }
        None => return Err(SyncError::Validation("'data' is missing".to_string())),
    };

    Ok(SyncRequest {
        records: data.iter().map(Record::from_json).collect(),
        table_name: body
            .get("tableName")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        truncate_first: body.get("truncateFirst").and_then(JsonValue::as_bool),
    })
}

fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;
    use serde_json::json;

    #[test]
    fn non_json_body_has_no_credential() {
        let body = decode_body(b"apiKey=s3cret");
        assert_eq!(body, JsonValue::Null);
        assert_eq!(credential(&body), None);
    }

    #[test]
    fn credential_must_be_a_string() {
        assert_eq!(credential(&json!({"apiKey": "k"})), Some("k"));
        assert_eq!(credential(&json!({"apiKey": 42})), None);
        assert_eq!(credential(&json!({"data": []})), None);
    }

    #[test]
    fn data_must_be_an_array() {
        for bad in [
            json!({"data": {}}),
            json!({"data": "rows"}),
            json!({"data": 1}),
            json!({"data": null}),
            json!({"data": true}),
            json!({}),
        ] {
            let err = parse_sync_payload(&bad).unwrap_err();
            assert!(matches!(err, SyncError::Validation(_)), "{}", bad);
            assert_eq!(err.to_string(), "Invalid data format");
        }
    }

    #[test]
    fn builds_request() {
        let req = parse_sync_payload(&json!({
            "data": [{"code": "1"}, "junk"],
            "tableName": "clients_2024",
            "truncateFirst": true
        }))
        .unwrap();
        assert_eq!(req.records.len(), 2);
        assert_eq!(
            req.records[0].get("code"),
            Some(&FieldValue::Text("1".to_string()))
        );
        assert_eq!(req.records[1], Record::default());
        assert_eq!(req.table_name.as_deref(), Some("clients_2024"));
        assert_eq!(req.truncate_first, Some(true));
    }

    #[test]
    fn mistyped_optional_fields_are_ignored() {
        let req = parse_sync_payload(&json!({
            "data": [],
            "tableName": 7,
            "truncateFirst": "yes"
        }))
        .unwrap();
        assert!(req.records.is_empty());
        assert_eq!(req.table_name, None);
        assert_eq!(req.truncate_first, None);
    }
}
