//! MCP tool definitions for unreal-mcp
//!
//! Defines the tools exposed to the agent through the MCP protocol.

use serde_json::{json, Value};

use super::protocol::Tool;

fn vector_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "number"},
        "minItems": 3,
        "maxItems": 3,
        "description": description
    })
}

/// Get all tool definitions for the unreal-mcp server
pub fn get_tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "get_actors_in_level".into(),
            description: "Get a list of actors in the current level".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "max_actors": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Maximum number of actors to return (default: 100, 0 for all)"
                    }
                }
            }),
        },
        Tool {
            name: "find_actors_by_name".into(),
            description: "Find actors whose name contains a pattern (case-sensitive substring match)".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pattern": {
                        "type": "string",
                        "description": "Text to search for in actor names, e.g. \"Light\" or \"BP_\""
                    }
                },
                "required": ["pattern"]
            }),
        },
        Tool {
            name: "spawn_actor".into(),
            description: "Create a new actor in the current level".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Unique name for the new actor"
                    },
                    "type": {
                        "type": "string",
                        "description": "Actor type, e.g. StaticMeshActor or PointLight"
                    },
                    "location": vector_schema("[x, y, z] world location (default: origin)"),
                    "rotation": vector_schema("[pitch, yaw, roll] in degrees (default: zero)")
                },
                "required": ["name", "type"]
            }),
        },
        Tool {
            name: "delete_actor".into(),
            description: "Delete an actor by name".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the actor to delete"}
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "set_actor_transform".into(),
            description: "Set the location, rotation and/or scale of an actor".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the actor"},
                    "location": vector_schema("[x, y, z] world location"),
                    "rotation": vector_schema("[pitch, yaw, roll] in degrees"),
                    "scale": vector_schema("[x, y, z] scale")
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "get_actor_properties".into(),
            description: "Get all properties of an actor".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the actor"}
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "set_actor_property".into(),
            description: "Set a property on an actor".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the actor"},
                    "property_name": {"type": "string", "description": "Property to set"},
                    "property_value": {"description": "New value (any JSON value)"}
                },
                "required": ["name", "property_name", "property_value"]
            }),
        },
        Tool {
            name: "focus_viewport".into(),
            description: "Focus the editor viewport on an actor or a location".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "target": {
                        "type": "string",
                        "description": "Actor to focus on (location is ignored when set)"
                    },
                    "location": vector_schema("[x, y, z] point to focus on when no target is given"),
                    "distance": {
                        "type": "number",
                        "description": "Camera distance from the target (default: 1000)"
                    },
                    "orientation": vector_schema("[pitch, yaw, roll] for the viewport camera")
                }
            }),
        },
        Tool {
            name: "spawn_blueprint_actor".into(),
            description: "Spawn an actor from a Blueprint".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "blueprint_name": {"type": "string", "description": "Blueprint to spawn from"},
                    "actor_name": {"type": "string", "description": "Name for the spawned actor"},
                    "location": vector_schema("[x, y, z] world location (default: origin)"),
                    "rotation": vector_schema("[pitch, yaw, roll] in degrees (default: zero)")
                },
                "required": ["blueprint_name", "actor_name"]
            }),
        },
        Tool {
            name: "get_console_output".into(),
            description: "Get recent output log lines from the editor, optionally filtered".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "max_lines": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Maximum number of log lines to return (default: 500)"
                    },
                    "severity": {
                        "type": "string",
                        "enum": ["All", "Display", "Warning", "Error"],
                        "description": "Severity filter (default: All)"
                    },
                    "category": {
                        "type": "string",
                        "description": "Log category filter, e.g. LogTemp (default: all categories)"
                    }
                }
            }),
        },
        Tool {
            name: "get_blueprint_data".into(),
            description: "Get a Blueprint's metadata, components and variables".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "blueprint_name": {
                        "type": "string",
                        "description": "Blueprint name or full asset path, e.g. BP_MyActor"
                    }
                },
                "required": ["blueprint_name"]
            }),
        },
        Tool {
            name: "engine_status".into(),
            description: "Report the engine connection state and command statistics without contacting the engine".into(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}
