//! Default paths for parkwatch components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/parkwatch/config.toml` or `~/.config/parkwatch/config.toml`
//! - Data: `$XDG_DATA_HOME/parkwatchd` or `~/.local/share/parkwatchd`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const PARKWATCH_CONFIG_ENV: &str = "PARKWATCH_CONFIG";

/// Environment variable for overriding the data directory
pub const PARKWATCH_DATA_DIR_ENV: &str = "PARKWATCH_DATA_DIR";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Slot snapshot filename within the data directory
const SLOTS_FILENAME: &str = "slots.json";

/// Config subdirectory name
const CONFIG_DIR: &str = "parkwatch";

/// Data subdirectory name
const APP_DIR: &str = "parkwatchd";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$PARKWATCH_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/parkwatch/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/parkwatch/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(PARKWATCH_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home)
            .join(CONFIG_DIR)
            .join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(CONFIG_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$PARKWATCH_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/parkwatchd` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/parkwatchd` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(PARKWATCH_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// XDG data directory, ignoring `$PARKWATCH_DATA_DIR`
fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Default location of the slot snapshot file read by the daemon
pub fn default_slots_path() -> PathBuf {
    default_data_dir().join(SLOTS_FILENAME)
}
