//! Level actor tools

use serde_json::{json, Map, Value};
use tracing::info;

use crate::bridge::Connector;
use crate::mcp::ToolResult;

use super::args::{vector_json, Vector3};
use super::{list_result, object_result, ToolHandlers};

impl<C: Connector> ToolHandlers<'_, C> {
    /// List actors in the current level; `max_actors == 0` means all
    pub async fn get_actors_in_level(&self, max_actors: u64) -> ToolResult {
        let result = self
            .dispatcher
            .dispatch("get_actors_in_level", json!({ "max_actors": max_actors }))
            .await;
        list_result(result, "actors")
    }

    /// Case-sensitive substring match on actor names
    pub async fn find_actors_by_name(&self, pattern: &str) -> ToolResult {
        let result = self
            .dispatcher
            .dispatch("find_actors_by_name", json!({ "pattern": pattern }))
            .await;
        list_result(result, "actors")
    }

    pub async fn spawn_actor(
        &self,
        name: &str,
        actor_type: &str,
        location: Vector3,
        rotation: Vector3,
    ) -> ToolResult {
        // The engine matches actor types by their upper-cased name
        let actor_type = actor_type.to_uppercase();
        info!(actor = %name, actor_type = %actor_type, "Spawning actor");

        let result = self
            .dispatcher
            .dispatch(
                "spawn_actor",
                json!({
                    "name": name,
                    "type": actor_type,
                    "location": vector_json(location),
                    "rotation": vector_json(rotation),
                }),
            )
            .await;
        object_result(result)
    }

    pub async fn delete_actor(&self, name: &str) -> ToolResult {
        let result = self
            .dispatcher
            .dispatch("delete_actor", json!({ "name": name }))
            .await;
        object_result(result)
    }

    /// Only the components that are given are sent
    pub async fn set_actor_transform(
        &self,
        name: &str,
        location: Option<Vector3>,
        rotation: Option<Vector3>,
        scale: Option<Vector3>,
    ) -> ToolResult {
        let mut params = Map::new();
        params.insert("name".into(), Value::String(name.to_string()));
        for (key, vector) in [("location", location), ("rotation", rotation), ("scale", scale)] {
            if let Some(v) = vector {
                params.insert(key.into(), vector_json(v));
            }
        }

        let result = self
            .dispatcher
            .dispatch("set_actor_transform", Value::Object(params))
            .await;
        object_result(result)
    }

    pub async fn get_actor_properties(&self, name: &str) -> ToolResult {
        let result = self
            .dispatcher
            .dispatch("get_actor_properties", json!({ "name": name }))
            .await;
        object_result(result)
    }

    pub async fn set_actor_property(
        &self,
        name: &str,
        property_name: &str,
        property_value: Value,
    ) -> ToolResult {
        let result = self
            .dispatcher
            .dispatch(
                "set_actor_property",
                json!({
                    "name": name,
                    "property_name": property_name,
                    "property_value": property_value,
                }),
            )
            .await;
        object_result(result)
    }

    pub async fn spawn_blueprint_actor(
        &self,
        blueprint_name: &str,
        actor_name: &str,
        location: Vector3,
        rotation: Vector3,
    ) -> ToolResult {
        info!(blueprint = %blueprint_name, actor = %actor_name, "Spawning blueprint actor");

        let result = self
            .dispatcher
            .dispatch(
                "spawn_blueprint_actor",
                json!({
                    "blueprint_name": blueprint_name,
                    "actor_name": actor_name,
                    "location": vector_json(location),
                    "rotation": vector_json(rotation),
                }),
            )
            .await;
        object_result(result)
    }
}
