//! MCP error types

use std::io;

use super::protocol::JsonRpcError;

/// Protocol-level errors of the MCP server
///
/// Bridge failures are not in here: they are reported inside a tool result.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// IO error (stdin/stdout)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::MethodNotFound(method) => JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ),
            McpError::InvalidParams(msg) => JsonRpcError::new(JsonRpcError::INVALID_PARAMS, msg),
            McpError::UnknownTool(name) => JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", name),
            ),
            McpError::Io(err) => {
                JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, format!("IO error: {}", err))
            }
            McpError::Json(err) => {
                JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("JSON error: {}", err))
            }
            McpError::Internal(msg) => JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: JsonRpcError = McpError::invalid_params("Missing 'name' parameter").into();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
        assert_eq!(err.message, "Missing 'name' parameter");

        let err: JsonRpcError = McpError::UnknownTool("fly".into()).into();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);
        assert_eq!(err.message, "Unknown tool: fly");

        let err: JsonRpcError = McpError::MethodNotFound("resources/list".into()).into();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);
    }
}
