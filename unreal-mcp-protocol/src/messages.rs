//! Command and reply types for the engine channel

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors raised while building a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("command name is empty")]
    EmptyName,

    #[error("command name '{0}' contains characters outside [A-Za-z0-9_]")]
    InvalidName(String),

    #[error("parameters must be a JSON object, got {0}")]
    ParamsNotObject(&'static str),
}

/// A single named request for the engine
///
/// Serializes to `{"command": <name>, "params": {...}}`. Fields are private
/// so a `Command` can only exist in a validated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "command")]
    name: String,
    params: Map<String, Value>,
}

impl Command {
    /// Build a command from a name and a JSON parameter object
    ///
    /// `Value::Null` is accepted as "no parameters".
    pub fn new(name: impl Into<String>, params: Value) -> Result<Self, CommandError> {
        let name = name.into();
        validate_name(&name)?;

        let params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(CommandError::ParamsNotObject(json_type_name(&other))),
        };

        Ok(Self { name, params })
    }

    /// Command name (engine verb)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command parameters
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

fn validate_name(name: &str) -> Result<(), CommandError> {
    if name.is_empty() {
        return Err(CommandError::EmptyName);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CommandError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One undecoded-shape reply from the engine
///
/// The codec guarantees the top-level value is a JSON object; everything
/// else about its shape is left to the normalizer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawReply(Map<String, Value>);

impl RawReply {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Look up a top-level field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for RawReply {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
