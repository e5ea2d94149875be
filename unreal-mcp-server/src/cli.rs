//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::BridgeConfig;

/// MCP server bridging an agent to a running Unreal Editor
#[derive(Parser, Debug)]
#[command(name = "unreal-mcp-server")]
#[command(about = "MCP stdio server for the Unreal Editor command bridge")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/unreal-mcp/config.toml)
    #[arg(long, env = "UNREAL_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Engine host, overrides engine.host
    #[arg(long, env = "UNREAL_MCP_HOST")]
    pub host: Option<String>,

    /// Engine port, overrides engine.port
    #[arg(long, env = "UNREAL_MCP_PORT")]
    pub port: Option<u16>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,
}

impl Cli {
    /// Apply command-line overrides on top of file configuration
    pub fn apply(&self, config: &mut BridgeConfig) {
        if let Some(host) = &self.host {
            config.engine.host = host.clone();
        }
        if let Some(port) = self.port {
            config.engine.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from(["unreal-mcp-server", "--host", "10.0.0.5", "--port", "6000"]).unwrap();
        let mut config = BridgeConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.engine.host, "10.0.0.5");
        assert_eq!(config.engine.port, 6000);
        assert!(!cli.log_stderr);
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let cli = Cli::try_parse_from(["unreal-mcp-server", "--log-stderr"]).unwrap();
        let mut config = BridgeConfig::default();
        config.engine.port = 55600;
        cli.apply(&mut config);

        assert_eq!(config.engine.port, 55600);
        assert!(cli.log_stderr);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["unreal-mcp-server", "--port", "99999"]).is_err());
    }
}
