//! Response envelope normalization.
//!
//! Upstream bodies arrive as plain JSON, as JSON wrapped in a JSON string, or
//! with stray bytes around the document. Success is flagged by `success`,
//! `status: "success"`, or a numeric `code`, depending on the endpoint. Every
//! service call funnels through [`interpret`] so call sites see one shape.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use crate::{CheckoutError, Result};

const MAX_UNWRAP_DEPTH: usize = 3;

/// Parse a body into JSON, undoing string wrapping and trimming junk.
pub fn normalize(body: &str) -> Result<Value> {
    let mut value = parse_lenient(body)?;
    for _ in 0..MAX_UNWRAP_DEPTH {
        match value {
            Value::String(inner) => match parse_lenient(&inner) {
                Ok(v) => value = v,
                Err(_) => return Ok(Value::String(inner)),
            },
            other => return Ok(other),
        }
    }
    Ok(value)
}

fn parse_lenient(body: &str) -> Result<Value> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    if let Ok(v) = serde_json::from_str(trimmed) { return Ok(v); }
    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            debug!(skipped_prefix = s, skipped_suffix = trimmed.len() - e - 1, "cleaning response body");
            serde_json::from_str(&trimmed[s..=e]).map_err(|err| CheckoutError::MalformedResponse(err.to_string()))
        }
        _ => Err(CheckoutError::MalformedResponse(format!("no JSON document in body ({} bytes)", body.len()))),
    }
}

/// Endpoint-level success flag, when the body carries one.
pub fn success_flag(v: &Value) -> Option<bool> {
    if let Some(b) = v.get("success").and_then(Value::as_bool) { return Some(b); }
    if let Some(s) = v.get("status").and_then(Value::as_str) {
        return match s.to_ascii_lowercase().as_str() {
            "success" | "ok" => Some(true),
            "error" | "fail" | "failed" => Some(false),
            _ => None,
        };
    }
    v.get("code").and_then(Value::as_i64).map(|c| (200..300).contains(&c))
}

pub fn message(v: &Value) -> Option<String> {
    v.get("message").or_else(|| v.get("error")).and_then(Value::as_str).map(str::to_string)
}

/// Turn an HTTP status and body into a typed result.
pub fn interpret<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let parsed = normalize(body);
    if !(200..300).contains(&status) {
        let message = parsed.ok().as_ref().and_then(message).unwrap_or_else(|| format!("Request failed with status {status}"));
        return Err(CheckoutError::ServerRejected { status: Some(status), message });
    }
    let value = parsed?;
    if success_flag(&value) == Some(false) {
        let message = message(&value).unwrap_or_else(|| "Request was rejected".to_string());
        return Err(CheckoutError::ServerRejected { status: Some(status), message });
    }
    serde_json::from_value(value).map_err(|err| CheckoutError::MalformedResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ack { status: String }

    #[test]
    fn test_plain_and_wrapped_bodies_agree() {
        let plain = r#"{"status":"success"}"#;
        let wrapped = serde_json::to_string(plain).unwrap();
        let noisy = "\u{feff}<br />notice: x\n{\"status\":\"success\"}\n\n";
        for body in [plain, wrapped.as_str(), noisy] {
            assert_eq!(interpret::<Ack>(200, body).unwrap(), Ack { status: "success".into() });
        }
    }

    #[test]
    fn test_success_flag_locations() {
        assert_eq!(success_flag(&serde_json::json!({"success": false})), Some(false));
        assert_eq!(success_flag(&serde_json::json!({"status": "error"})), Some(false));
        assert_eq!(success_flag(&serde_json::json!({"code": 400, "message": "bad"})), Some(false));
        assert_eq!(success_flag(&serde_json::json!({"code": 200})), Some(true));
        assert_eq!(success_flag(&serde_json::json!({"data": []})), None);
    }

    #[test]
    fn test_rejection_keeps_server_message() {
        let err = interpret::<Ack>(200, r#"{"success":false,"message":"Không đủ điểm"}"#).unwrap_err();
        assert_eq!(err, CheckoutError::ServerRejected { status: Some(200), message: "Không đủ điểm".into() });
        let err = interpret::<Ack>(422, r#"{"message":"Ward code invalid"}"#).unwrap_err();
        assert_eq!(err.user_message(), "Ward code invalid");
        let err = interpret::<Ack>(500, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, CheckoutError::ServerRejected { status: Some(500), .. }));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(interpret::<Ack>(200, "not json"), Err(CheckoutError::MalformedResponse(_))));
        assert!(matches!(interpret::<Ack>(200, r#"{"other":1}"#), Err(CheckoutError::MalformedResponse(_))));
    }
}
