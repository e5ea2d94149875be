//! Configuration schema structs

use std::time::Duration;

use serde::{Deserialize, Serialize};
use unreal_mcp_protocol::DEFAULT_ENGINE_PORT;
use unreal_mcp_utils::DEFAULT_LOG_FILE;

/// Smallest accepted connect/response timeout
pub const MIN_TIMEOUT_MS: u64 = 100;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Engine endpoint and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Host running the engine plugin
    pub host: String,
    /// Port the engine plugin listens on
    pub port: u16,
    /// Bound on establishing a connection
    pub connect_timeout_ms: u64,
    /// Bound on waiting for one reply
    pub response_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_ENGINE_PORT,
            connect_timeout_ms: 5000,
            response_timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string; `UNREAL_MCP_LOG` overrides it
    pub filter: String,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            file_name: DEFAULT_LOG_FILE.into(),
        }
    }
}
