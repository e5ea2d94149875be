//! Path utilities for unreal-mcp
//!
//! Handles XDG Base Directory locations for the configuration file and the
//! log directory.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application identifier for XDG directories
const APP_NAME: &str = "unreal-mcp";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/unreal-mcp` or `~/.config/unreal-mcp`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(fallback_config_dir)
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/unreal-mcp/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory
///
/// Location: `$XDG_STATE_HOME/unreal-mcp` or `~/.local/state/unreal-mcp`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(fallback_state_dir)
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/unreal-mcp/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

// Fallbacks when ProjectDirs is unavailable (no HOME, e.g. under some launchers)

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn fallback_config_dir() -> PathBuf {
    home_dir().join(".config").join(APP_NAME)
}

fn fallback_state_dir() -> PathBuf {
    home_dir().join(".local").join("state").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_in_config_dir() {
        let file = config_file();
        assert!(file.starts_with(config_dir()));
        assert_eq!(file.file_name().unwrap(), "config.toml");
    }

    #[test]
    fn test_config_dir_names_app() {
        assert!(config_dir().to_string_lossy().contains(APP_NAME));
    }

    #[test]
    fn test_log_dir_is_in_state_dir() {
        let log = log_dir();
        assert!(log.starts_with(state_dir()));
        assert!(log.ends_with("log"));
    }

    #[test]
    fn test_fallback_dirs_name_app() {
        assert!(fallback_config_dir().ends_with(APP_NAME));
        assert!(fallback_state_dir().ends_with(APP_NAME));
    }
}
