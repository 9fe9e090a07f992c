//! Configuration and log file locations
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/ssh-acceptance/` and `~/.local/share/ssh-acceptance/`
//! - macOS: `~/Library/Application Support/ssh-acceptance/`
//! - Windows: `%APPDATA%\ssh-acceptance\`

use std::path::PathBuf;

/// Application name used for directory lookup
const APP_NAME: &str = "ssh-acceptance";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}

/// Get the path to the run log file
pub fn run_log_path() -> Option<PathBuf> {
    log_dir().map(|dir| dir.join("run.log"))
}
