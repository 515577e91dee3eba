//! Configuration file locations

use std::path::PathBuf;

/// Name used for the per-user config directory
const APP_NAME: &str = "ws-harness";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/ws-harness/`
/// - macOS: `~/Library/Application Support/ws-harness/`
/// - Windows: `%APPDATA%\ws-harness\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
