//! Editor, console and blueprint tools

use serde_json::{json, Map, Value};

use crate::bridge::Connector;
use crate::mcp::ToolResult;

use super::args::{vector_json, Vector3};
use super::{failure_body, object_result, ToolHandlers};

impl<C: Connector> ToolHandlers<'_, C> {
    /// Point the editor camera at an actor or a location
    ///
    /// `target` wins when both are given.
    pub async fn focus_viewport(
        &self,
        target: Option<&str>,
        location: Option<Vector3>,
        distance: f64,
        orientation: Option<Vector3>,
    ) -> ToolResult {
        let mut params = Map::new();
        match (target, location) {
            (Some(target), _) => {
                params.insert("target".into(), Value::String(target.to_string()));
            }
            (None, Some(location)) => {
                params.insert("location".into(), vector_json(location));
            }
            (None, None) => {}
        }
        params.insert("distance".into(), json!(distance));
        if let Some(orientation) = orientation {
            params.insert("orientation".into(), vector_json(orientation));
        }

        let result = self
            .dispatcher
            .dispatch("focus_viewport", Value::Object(params))
            .await;
        object_result(result)
    }

    /// Recent editor output log lines
    pub async fn get_console_output(
        &self,
        max_lines: u64,
        severity: &str,
        category: &str,
    ) -> ToolResult {
        let result = self
            .dispatcher
            .dispatch(
                "get_console_output",
                json!({
                    "max_lines": max_lines,
                    "severity": severity,
                    "category": category,
                }),
            )
            .await;

        match result {
            Ok(payload) => ToolResult::json(&payload),
            Err(e) => {
                let mut body = failure_body(&e);
                body.insert("logs".into(), Value::Array(Vec::new()));
                body.insert("count".into(), json!(0));
                ToolResult::json_error(&Value::Object(body))
            }
        }
    }

    /// Full blueprint document: info, components, variables
    pub async fn get_blueprint_data(&self, blueprint_name: &str) -> ToolResult {
        let result = self
            .dispatcher
            .dispatch("get_blueprint_data", json!({ "blueprint_name": blueprint_name }))
            .await;
        object_result(result)
    }

    /// Connection state and dispatch counters, without touching the engine
    pub fn engine_status(&self) -> ToolResult {
        let manager = self.dispatcher.manager();
        ToolResult::json(&json!({
            "endpoint": manager.endpoint(),
            "state": manager.state(),
            "stats": self.dispatcher.stats(),
        }))
    }
}
