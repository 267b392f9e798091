//! Wire protocol types.
//!
//! Requests arrive one JSON object per line with a `type` field, an
//! optional `correlationId` echoed back verbatim, and operation
//! parameters. Responses are one JSON object per line.

use serde::Deserialize;
use serde_json::{json, Value};

/// Recognized request operations
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    StartMonitoring,
    StopMonitoring,
    ExtractFeatures { frames: Vec<String> },
    ExtractScoresFromFrames { frames: Vec<String> },
    ExtractScoresFromPaths { paths: Vec<String> },
    DetectPhoneFromFrames { frames: Vec<String> },
    DetectPhoneFromPaths { paths: Vec<String> },
    Ping,
}

/// Parse a decoded JSON object into a request.
///
/// An unrecognized `type` is reported as the fixed `"unknown type"`
/// message; anything else surfaces the deserializer's message.
pub fn parse_request(value: &Value) -> Result<Request, String> {
    serde_json::from_value(value.clone()).map_err(|e| {
        let message = e.to_string();
        if message.starts_with("unknown variant") || message.starts_with("missing field `type`") {
            "unknown type".to_string()
        } else {
            message
        }
    })
}

/// Attach the echoed correlation id, if the request carried one.
fn with_correlation(mut response: Value, correlation_id: Option<&Value>) -> Value {
    if let (Some(object), Some(id)) = (response.as_object_mut(), correlation_id) {
        object.insert("correlationId".to_string(), id.clone());
    }
    response
}

/// A typed success response.
pub fn ok(kind: &str, data: Value, correlation_id: Option<&Value>) -> Value {
    with_correlation(json!({ "type": kind, "data": data }), correlation_id)
}

/// A bare success response with no payload (e.g. `pong`).
pub fn ack(kind: &str, correlation_id: Option<&Value>) -> Value {
    with_correlation(json!({ "type": kind }), correlation_id)
}

/// The error envelope. One per failed line; the dispatcher keeps reading.
pub fn error(message: impl Into<String>, correlation_id: Option<&Value>) -> Value {
    with_correlation(
        json!({ "type": "error", "data": message.into() }),
        correlation_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let value = json!({ "type": "ping" });
        assert!(matches!(parse_request(&value), Ok(Request::Ping)));

        let value = json!({ "type": "extract_features", "frames": ["abc"] });
        match parse_request(&value).unwrap() {
            Request::ExtractFeatures { frames } => assert_eq!(frames, vec!["abc"]),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_message() {
        let value = json!({ "type": "launch_missiles" });
        assert_eq!(parse_request(&value).unwrap_err(), "unknown type");

        let value = json!({ "data": 1 });
        assert_eq!(parse_request(&value).unwrap_err(), "unknown type");
    }

    #[test]
    fn test_missing_params_surface_deserializer_error() {
        let value = json!({ "type": "extract_features" });
        let message = parse_request(&value).unwrap_err();
        assert!(message.contains("frames"), "message: {message}");
    }

    #[test]
    fn test_correlation_echo() {
        let id = json!(42);
        let response = ok("pong", json!(null), Some(&id));
        assert_eq!(response["correlationId"], 42);

        let response = error("boom", None);
        assert!(response.get("correlationId").is_none());
        assert_eq!(response["type"], "error");
        assert_eq!(response["data"], "boom");
    }
}
