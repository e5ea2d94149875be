//! MCP server loop
//!
//! Reads one JSON-RPC request per line and writes one response per line.
//! Requests are handled in order; the engine bridge only carries one
//! command at a time anyway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::bridge::{Connector, Dispatcher};
use crate::tools::ToolHandlers;

use super::error::McpError;
use super::protocol::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolsListResult,
};
use super::tools::get_tool_definitions;

/// Request counter for log correlation within this process
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// MCP server over a line-oriented byte stream
pub struct McpServer<C: Connector> {
    dispatcher: Dispatcher<C>,
    initialized: bool,
}

impl<C: Connector> McpServer<C> {
    pub fn new(dispatcher: Dispatcher<C>) -> Self {
        Self {
            dispatcher,
            initialized: false,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn run_stdio(&mut self) -> Result<(), McpError> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve `input`/`output` until `input` reaches EOF
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        info!(endpoint = %self.dispatcher.manager().endpoint(), "MCP server starting");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let req_id = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
            debug!(req_id, raw = %line, "Received raw JSON-RPC request");

            let start = Instant::now();
            let response = self.handle_line(req_id, line).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            let Some(response) = response else {
                info!(req_id, elapsed_ms, "Notification handled (no response)");
                continue;
            };

            if let Some(err) = &response.error {
                warn!(req_id, elapsed_ms, code = err.code, error = %err.message, "JSON-RPC request completed with error");
            } else {
                info!(req_id, elapsed_ms, "JSON-RPC request completed successfully");
            }

            let mut json = serde_json::to_string(&response)?;
            debug!(req_id, raw = %json, "Sending raw JSON-RPC response");
            json.push('\n');
            output.write_all(json.as_bytes()).await?;
            output.flush().await?;
        }

        info!("MCP server input closed, shutting down");
        Ok(())
    }

    /// Parse and handle one input line
    async fn handle_line(&mut self, req_id: u64, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!(req_id, error = %e, "Failed to parse JSON-RPC request");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::new(JsonRpcError::PARSE_ERROR, e.to_string()),
                ));
            }
        };

        info!(req_id, method = %request.method, jsonrpc_id = ?request.id, "Incoming JSON-RPC request");

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::with_data(
                    JsonRpcError::INVALID_REQUEST,
                    "Invalid JSON-RPC version",
                    json!({"expected": "2.0", "got": request.jsonrpc}),
                ),
            ));
        }

        self.handle_request(request).await
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            _ => Err(McpError::MethodNotFound(request.method.clone())),
        };

        if request.is_notification() {
            if let Err(e) = result {
                warn!(method = %request.method, error = %e, "Notification handling failed");
            }
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::error(request.id, e.into()),
        })
    }

    fn handle_initialize(&mut self) -> Result<Value, McpError> {
        self.initialized = true;
        info!("MCP server initialized");
        serde_json::to_value(InitializeResult::default()).map_err(|e| McpError::Internal(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let result = ToolsListResult {
            tools: get_tool_definitions(),
        };
        serde_json::to_value(result).map_err(|e| McpError::Internal(e.to_string()))
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params["name"]
            .as_str()
            .ok_or_else(|| McpError::invalid_params("Missing 'name' parameter"))?;
        let arguments = &params["arguments"];

        info!(tool = %name, "Dispatching tool call");
        debug!(tool = %name, arguments = %arguments, "Tool call arguments");

        let result = ToolHandlers::new(&self.dispatcher).call(name, arguments).await;
        match &result {
            Ok(tool_result) if tool_result.is_error() => {
                warn!(tool = %name, "Tool call reported failure")
            }
            Ok(_) => info!(tool = %name, "Tool call completed successfully"),
            Err(e) => error!(tool = %name, error = %e, "Tool call rejected"),
        }

        serde_json::to_value(result?).map_err(|e| McpError::Internal(e.to_string()))
    }
}
