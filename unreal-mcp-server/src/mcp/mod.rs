//! MCP (Model Context Protocol) server
//!
//! Exposes the engine tools to an agent as JSON-RPC 2.0 over stdio.

pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::McpError;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, Tool, ToolResult};
pub use server::McpServer;
