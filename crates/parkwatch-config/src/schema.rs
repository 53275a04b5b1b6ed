//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Scheduler settings
    #[serde(default)]
    pub monitor: RawMonitorConfig,

    /// Overtime rule parameters
    #[serde(default)]
    pub rules: RawRules,

    /// Where slot snapshots come from
    #[serde(default)]
    pub source: RawSource,

    /// How alerts are emitted
    #[serde(default)]
    pub alerts: RawAlerts,
}

/// Scheduler settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMonitorConfig {
    /// Seconds between checks (default: 300)
    pub interval_seconds: Option<u64>,

    /// Run a check immediately at start-up (default: true)
    pub check_on_start: Option<bool>,
}

/// Overtime rule parameters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRules {
    /// Hours an hourly session may stay before it is overtime (default: 6)
    pub hourly_allowance_hours: Option<f64>,

    /// Civil hour at which the day-pass detection window closes (default: 6)
    pub day_pass_window_end_hour: Option<u32>,
}

/// Snapshot source
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSource {
    /// JSON file holding `{"slots": [...]}`
    pub slots_path: Option<PathBuf>,
}

/// Alert output
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAlerts {
    /// "log" or "json"
    pub format: Option<String>,
}
