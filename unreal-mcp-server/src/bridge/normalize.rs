//! Response normalization
//!
//! The engine's command handlers answer in three shapes: a flat object with
//! a `success` flag, an object wrapping the payload under `result`, or a
//! `status`/`error` pair on failure. Everything above the bridge sees one
//! shape instead.

use serde_json::{json, Map, Value};

use unreal_mcp_protocol::RawReply;

use super::error::BridgeError;
use super::NormalizedResult;

/// Message used when a failure reply carries no text
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Reconcile one engine reply into a [`NormalizedResult`]
///
/// Failure indicators are checked first, so a reply that reports an error
/// and also carries a `result` is a failure. A `result` wrapper is stripped
/// exactly once. The canonical `{"ok": true, "payload": X}` shape unwraps to
/// `X`, which makes `normalize` a fixed point over [`to_canonical`].
pub fn normalize(reply: RawReply) -> NormalizedResult {
    let mut fields = reply.into_inner();

    if is_failure(&fields) {
        return Err(BridgeError::Engine(failure_message(&fields)));
    }

    if let Some(inner) = fields.remove("result") {
        return Ok(inner);
    }

    if fields.get("ok") == Some(&Value::Bool(true)) {
        if let Some(payload) = fields.remove("payload") {
            return Ok(payload);
        }
    }

    Ok(Value::Object(fields))
}

/// Render a result in its canonical JSON form
pub fn to_canonical(result: &NormalizedResult) -> Value {
    match result {
        Ok(payload) => json!({ "ok": true, "payload": payload }),
        Err(err) => json!({ "ok": false, "error": err.to_string() }),
    }
}

fn is_failure(fields: &Map<String, Value>) -> bool {
    let status_error = fields
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("error"));

    status_error
        || fields.get("success") == Some(&Value::Bool(false))
        || fields.get("ok") == Some(&Value::Bool(false))
        || fields.get("error").is_some_and(has_error_content)
}

/// `null`, `false` and `""` in an `error` field mean "no error"
fn has_error_content(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn failure_message(fields: &Map<String, Value>) -> String {
    ["error", "message"]
        .iter()
        .filter_map(|key| fields.get(*key))
        .find_map(message_text)
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // Some handlers nest the text one level down
        Value::Object(map) => map.get("message").and_then(message_text),
        Value::Null | Value::Bool(_) | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
