//! unreal-mcp server binary
//!
//! Speaks MCP on stdin/stdout, so logs go to a file unless `--log-stderr`.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use unreal_mcp_server::bridge;
use unreal_mcp_server::cli::Cli;
use unreal_mcp_server::config::ConfigLoader;
use unreal_mcp_server::mcp::McpServer;
use unreal_mcp_utils::{init_logging_with_config, LogConfig, LogOutput, Result, UnrealMcpError};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_from(cli.config.as_deref())?;
    cli.apply(&mut config);
    ConfigLoader::validate(&config)?;

    let mut log_config = LogConfig::mcp_server(&config.logging.filter);
    log_config.file_name = Some(config.logging.file_name.clone());
    if cli.log_stderr {
        log_config.output = LogOutput::Stderr;
    }
    init_logging_with_config(log_config)?;

    info!(
        host = %config.engine.host,
        port = config.engine.port,
        "unreal-mcp server starting"
    );

    let dispatcher = bridge::tcp_dispatcher(&config.engine);
    let manager = Arc::clone(dispatcher.manager());
    let mut server = McpServer::new(dispatcher);

    let result = server.run_stdio().await;
    manager.shutdown().await;

    match result {
        Ok(()) => {
            info!("unreal-mcp server stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "MCP server failed");
            Err(UnrealMcpError::internal(format!("MCP server failed: {}", e)))
        }
    }
}
