//! unreal-mcp-server: MCP tools for a running Unreal Editor
//!
//! The [`bridge`] owns the single engine connection; [`tools`] and [`mcp`]
//! are thin layers on top of it.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod mcp;
pub mod tools;
