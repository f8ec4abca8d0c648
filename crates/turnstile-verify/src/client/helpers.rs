//! Pure helpers: siteverify body decoding (no HTTP, no status logic).

use serde_json::Value;

use crate::error::{TurnstileError, TurnstileResult};

/// Decoded siteverify answer.
///
/// Only `success` drives the decision; the other fields are kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteverifyReply {
    /// True only when the body carried `"success": true`.
    pub success: bool,

    /// `error-codes` reported by the remote, if any.
    pub error_codes: Vec<String>,

    /// Hostname the token was issued for.
    pub hostname: Option<String>,
}

/// Decode a siteverify body.
///
/// The body must be a UTF-8 JSON object. Within it, `success` counts only when it is the
/// boolean `true`; every other shape of every field is tolerated.
pub(crate) fn parse_reply(body: &[u8]) -> TurnstileResult<SiteverifyReply> {
    let value: Value = serde_json::from_slice(body).map_err(|e| TurnstileError::InvalidResponse {
        message: format!("failed to decode siteverify body: {}", e),
    })?;

    let object = value
        .as_object()
        .ok_or_else(|| TurnstileError::InvalidResponse {
            message: format!("expected a JSON object, got {}", json_kind(&value)),
        })?;

    let success = matches!(object.get("success"), Some(Value::Bool(true)));

    let error_codes = object
        .get("error-codes")
        .and_then(|v| v.as_array())
        .map(|codes| {
            codes
                .iter()
                .filter_map(|c| c.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let hostname = object
        .get("hostname")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(SiteverifyReply {
        success,
        error_codes,
        hostname,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
