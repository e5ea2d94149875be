//! Configuration loader

use std::path::Path;

use unreal_mcp_utils::{config_file, Result, UnrealMcpError};

use super::schema::MIN_TIMEOUT_MS;
use super::BridgeConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<BridgeConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(BridgeConfig::default())
        }
    }

    /// Load configuration from a specific path
    ///
    /// Unlike [`load`](Self::load), a missing file is an error here: the
    /// path was asked for explicitly.
    pub fn load_from_path(path: &Path) -> Result<BridgeConfig> {
        if !path.exists() {
            return Err(UnrealMcpError::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| UnrealMcpError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<BridgeConfig> {
        toml::from_str(content).map_err(|e| UnrealMcpError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &BridgeConfig) -> Result<()> {
        if config.engine.host.trim().is_empty() {
            return Err(UnrealMcpError::config("engine.host must not be empty"));
        }

        if config.engine.port == 0 {
            return Err(UnrealMcpError::config("engine.port must be non-zero"));
        }

        if config.engine.connect_timeout_ms < MIN_TIMEOUT_MS {
            return Err(UnrealMcpError::config(format!(
                "engine.connect_timeout_ms must be at least {}",
                MIN_TIMEOUT_MS
            )));
        }

        if config.engine.response_timeout_ms < MIN_TIMEOUT_MS {
            return Err(UnrealMcpError::config(format!(
                "engine.response_timeout_ms must be at least {}",
                MIN_TIMEOUT_MS
            )));
        }

        if config.logging.file_name.trim().is_empty() {
            return Err(UnrealMcpError::config("logging.file_name must not be empty"));
        }

        Ok(())
    }

    /// Load from `path` if given, else from the default location
    pub fn load_from(path: Option<&Path>) -> Result<BridgeConfig> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }
}
