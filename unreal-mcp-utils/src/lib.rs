//! unreal-mcp-utils: Shared utilities for unreal-mcp
//!
//! Error type, logging setup and XDG path helpers used by the bridge binary.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Result, UnrealMcpError};
pub use logging::{
    init_logging_with_config, resolve_filter, LogConfig, LogOutput, DEFAULT_LOG_FILE, LOG_ENV_VAR,
};
pub use paths::{config_dir, config_file, log_dir, state_dir};
