//! Argument extraction for tool calls

use serde_json::{json, Value};

use crate::mcp::McpError;

/// A 3-component float vector (location, rotation or scale)
pub type Vector3 = [f64; 3];

pub const ZERO: Vector3 = [0.0, 0.0, 0.0];

/// Required non-empty string argument
pub fn required_str<'a>(arguments: &'a Value, field: &str) -> Result<&'a str, McpError> {
    match arguments[field].as_str() {
        Some(s) if !s.is_empty() => Ok(s),
        Some(_) => Err(McpError::invalid_params(format!("'{}' must not be empty", field))),
        None => Err(McpError::invalid_params(format!("Missing '{}' parameter", field))),
    }
}

/// Optional string argument; null counts as absent
pub fn optional_str<'a>(arguments: &'a Value, field: &str) -> Result<Option<&'a str>, McpError> {
    match &arguments[field] {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.as_str())),
        _ => Err(McpError::invalid_params(format!("'{}' must be a string", field))),
    }
}

/// Optional non-negative integer argument
pub fn optional_u64(arguments: &Value, field: &str, default: u64) -> Result<u64, McpError> {
    match &arguments[field] {
        Value::Null => Ok(default),
        value => value.as_u64().ok_or_else(|| {
            McpError::invalid_params(format!("'{}' must be a non-negative integer", field))
        }),
    }
}

/// Optional number argument
pub fn optional_f64(arguments: &Value, field: &str, default: f64) -> Result<f64, McpError> {
    match &arguments[field] {
        Value::Null => Ok(default),
        value => value
            .as_f64()
            .ok_or_else(|| McpError::invalid_params(format!("'{}' must be a number", field))),
    }
}

/// Optional 3-float vector; null counts as absent
pub fn optional_vector(arguments: &Value, field: &str) -> Result<Option<Vector3>, McpError> {
    match &arguments[field] {
        Value::Null => Ok(None),
        value => parse_vector(value)
            .map(Some)
            .ok_or_else(|| invalid_vector(field)),
    }
}

/// Vector argument that falls back to zeros when absent
pub fn vector_or_zero(arguments: &Value, field: &str) -> Result<Vector3, McpError> {
    Ok(optional_vector(arguments, field)?.unwrap_or(ZERO))
}

pub fn vector_json(v: Vector3) -> Value {
    json!(v)
}

fn parse_vector(value: &Value) -> Option<Vector3> {
    let items = value.as_array()?;
    if items.len() != 3 {
        return None;
    }
    let mut out = ZERO;
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

fn invalid_vector(field: &str) -> McpError {
    McpError::invalid_params(format!(
        "Invalid {} format. Must be a list of 3 float values.",
        field
    ))
}
