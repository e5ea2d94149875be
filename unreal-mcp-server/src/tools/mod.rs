//! Tool adapters
//!
//! Each tool validates its arguments, sends one engine command through the
//! [`Dispatcher`] and shapes the result. Argument problems are protocol
//! errors (`McpError::InvalidParams`); anything that goes wrong after that is
//! reported inside the tool result as `{"success": false, "message": ...}`.

mod actors;
pub mod args;
mod editor;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::bridge::{BridgeError, Connector, Dispatcher, NormalizedResult};
use crate::mcp::{McpError, ToolResult};

use self::args::{optional_f64, optional_str, optional_u64, optional_vector, required_str, vector_or_zero};

/// Console severities accepted by `get_console_output`
pub const SEVERITIES: [&str; 4] = ["All", "Display", "Warning", "Error"];

/// Tool handlers bound to one dispatcher
pub struct ToolHandlers<'a, C: Connector> {
    dispatcher: &'a Dispatcher<C>,
}

impl<'a, C: Connector> ToolHandlers<'a, C> {
    pub fn new(dispatcher: &'a Dispatcher<C>) -> Self {
        Self { dispatcher }
    }

    /// Route a `tools/call` by tool name
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<ToolResult, McpError> {
        debug!(tool = %name, "Routing tool call");

        match name {
            "get_actors_in_level" => {
                let max_actors = optional_u64(arguments, "max_actors", 100)?;
                Ok(self.get_actors_in_level(max_actors).await)
            }
            "find_actors_by_name" => {
                let pattern = required_str(arguments, "pattern")?;
                Ok(self.find_actors_by_name(pattern).await)
            }
            "spawn_actor" => {
                let name = required_str(arguments, "name")?;
                let actor_type = required_str(arguments, "type")?;
                let location = vector_or_zero(arguments, "location")?;
                let rotation = vector_or_zero(arguments, "rotation")?;
                Ok(self.spawn_actor(name, actor_type, location, rotation).await)
            }
            "delete_actor" => {
                let name = required_str(arguments, "name")?;
                Ok(self.delete_actor(name).await)
            }
            "set_actor_transform" => {
                let name = required_str(arguments, "name")?;
                let location = optional_vector(arguments, "location")?;
                let rotation = optional_vector(arguments, "rotation")?;
                let scale = optional_vector(arguments, "scale")?;
                Ok(self.set_actor_transform(name, location, rotation, scale).await)
            }
            "get_actor_properties" => {
                let name = required_str(arguments, "name")?;
                Ok(self.get_actor_properties(name).await)
            }
            "set_actor_property" => {
                let name = required_str(arguments, "name")?;
                let property_name = required_str(arguments, "property_name")?;
                let property_value = match arguments.get("property_value") {
                    Some(value) => value.clone(),
                    None => {
                        return Err(McpError::invalid_params(
                            "Missing 'property_value' parameter",
                        ))
                    }
                };
                Ok(self.set_actor_property(name, property_name, property_value).await)
            }
            "spawn_blueprint_actor" => {
                let blueprint_name = required_str(arguments, "blueprint_name")?;
                let actor_name = required_str(arguments, "actor_name")?;
                let location = vector_or_zero(arguments, "location")?;
                let rotation = vector_or_zero(arguments, "rotation")?;
                Ok(self
                    .spawn_blueprint_actor(blueprint_name, actor_name, location, rotation)
                    .await)
            }
            "focus_viewport" => {
                let target = optional_str(arguments, "target")?.filter(|t| !t.is_empty());
                let location = optional_vector(arguments, "location")?;
                let distance = optional_f64(arguments, "distance", 1000.0)?;
                let orientation = optional_vector(arguments, "orientation")?;
                if target.is_none() && location.is_none() {
                    return Err(McpError::invalid_params(
                        "Either 'target' or 'location' must be provided",
                    ));
                }
                Ok(self.focus_viewport(target, location, distance, orientation).await)
            }
            "get_console_output" => {
                let max_lines = optional_u64(arguments, "max_lines", 500)?;
                let severity = parse_severity(optional_str(arguments, "severity")?)?;
                let category = optional_str(arguments, "category")?.unwrap_or("");
                Ok(self.get_console_output(max_lines, severity, category).await)
            }
            "get_blueprint_data" => {
                let blueprint_name = required_str(arguments, "blueprint_name")?;
                Ok(self.get_blueprint_data(blueprint_name).await)
            }
            "engine_status" => Ok(self.engine_status()),
            _ => Err(McpError::UnknownTool(name.to_string())),
        }
    }
}

/// Match a severity name case-insensitively; absent means "All"
pub fn parse_severity(raw: Option<&str>) -> Result<&'static str, McpError> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(SEVERITIES[0]);
    };
    SEVERITIES
        .iter()
        .find(|s| s.eq_ignore_ascii_case(raw))
        .copied()
        .ok_or_else(|| {
            McpError::invalid_params(format!(
                "Invalid severity '{}'. Must be one of: {}",
                raw,
                SEVERITIES.join(", ")
            ))
        })
}

/// The structured failure body every tool reports
fn failure_body(err: &BridgeError) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(false));
    body.insert("message".into(), Value::String(err.to_string()));
    body
}

/// Result of a tool that returns the engine payload as-is
fn object_result(result: NormalizedResult) -> ToolResult {
    match result {
        Ok(payload) => ToolResult::json(&payload),
        Err(e) => ToolResult::json_error(&Value::Object(failure_body(&e))),
    }
}

/// Result of a tool that returns a list found under `key` in the payload
///
/// The list is always present in the body, empty on failure, so callers see
/// one shape. A payload without the list is a failure, not an empty list.
fn list_result(result: NormalizedResult, key: &str) -> ToolResult {
    let items = match result {
        Ok(Value::Array(items)) => Ok(items),
        Ok(Value::Object(mut payload)) => match payload.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(format!("Unexpected response format: missing '{}' list", key)),
        },
        Ok(other) => Err(format!("Unexpected response format: {}", other)),
        Err(e) => Err(e.to_string()),
    };

    match items {
        Ok(items) => {
            let count = items.len();
            let mut body = Map::new();
            body.insert("success".into(), Value::Bool(true));
            body.insert(key.into(), Value::Array(items));
            body.insert("count".into(), json!(count));
            ToolResult::json(&Value::Object(body))
        }
        Err(message) => {
            let mut body = Map::new();
            body.insert("success".into(), Value::Bool(false));
            body.insert("message".into(), Value::String(message));
            body.insert(key.into(), Value::Array(Vec::new()));
            ToolResult::json_error(&Value::Object(body))
        }
    }
}
