//! Logging infrastructure for unreal-mcp
//!
//! Provides unified logging setup using the tracing ecosystem. The MCP server
//! speaks JSON-RPC on stdout, so its logs go to a file (or stderr) and never
//! to stdout.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, Result, UnrealMcpError};

/// Environment variable that overrides the configured log filter
pub const LOG_ENV_VAR: &str = "UNREAL_MCP_LOG";

/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "unreal-mcp.log";

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr
    Stderr,
    /// Log to file
    File,
    /// Log to both stderr and file
    Both,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output destination
    pub output: LogOutput,
    /// Log level filter (e.g., "info", "debug", "unreal_mcp_server=debug,tokio=warn")
    pub filter: String,
    /// Include span events (enter/exit)
    pub span_events: bool,
    /// Include file/line in logs
    pub file_line: bool,
    /// Optional custom log file name (defaults to "unreal-mcp.log")
    pub file_name: Option<String>,
    /// Optional log directory (defaults to the XDG state log dir)
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            span_events: false,
            file_line: false,
            file_name: None,
            directory: None,
        }
    }
}

impl LogConfig {
    /// Create config for the MCP stdio server (file logging)
    ///
    /// `configured_filter` comes from the config file; `UNREAL_MCP_LOG` wins
    /// over it when set.
    pub fn mcp_server(configured_filter: &str) -> Self {
        Self {
            output: LogOutput::File,
            filter: resolve_filter(std::env::var(LOG_ENV_VAR).ok(), configured_filter),
            span_events: false,
            file_line: true,
            file_name: None,
            directory: None,
        }
    }

    /// Full path of the log file this config writes to
    pub fn log_path(&self) -> PathBuf {
        let dir = self.directory.clone().unwrap_or_else(paths::log_dir);
        dir.join(self.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE))
    }
}

/// Pick the effective filter: a non-empty environment value beats the
/// configured one
pub fn resolve_filter(env_value: Option<String>, configured: &str) -> String {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| configured.to_string())
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| UnrealMcpError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let fmt_layer = if config.span_events {
        fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    } else {
        fmt_layer
    };

    let fmt_layer = if config.file_line {
        fmt_layer.with_file(true).with_line_number(true)
    } else {
        fmt_layer.with_file(false).with_line_number(false)
    };

    match config.output {
        LogOutput::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| UnrealMcpError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::File => {
            let file = open_log_file(&config.log_path())?;

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
                .map_err(|e| UnrealMcpError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::Both => {
            let file = open_log_file(&config.log_path())?;

            let file_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .with(file_layer)
                .try_init()
                .map_err(|e| UnrealMcpError::internal(format!("Failed to init logging: {}", e)))?;
        }
    }

    Ok(())
}

/// Create the log directory if needed and open the log file for appending
fn open_log_file(log_path: &Path) -> Result<File> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| UnrealMcpError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| UnrealMcpError::FileWrite {
            path: log_path.to_path_buf(),
            source: e,
        })
}
