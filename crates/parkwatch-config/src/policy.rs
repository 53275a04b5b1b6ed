//! Validated monitor settings

use crate::schema::RawConfig;
use crate::validation::parse_alert_format;
use parkwatch_util::default_slots_path;
use std::path::PathBuf;
use std::time::Duration;

/// Reference check period (5 minutes)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Hours an hourly session may stay before it is overtime
pub const DEFAULT_HOURLY_ALLOWANCE_HOURS: f64 = 6.0;

/// Civil hour at which the day-pass detection window closes
pub const DEFAULT_DAY_PASS_WINDOW_END_HOUR: u32 = 6;

/// Validated settings ready for use by the monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorPolicy {
    pub monitor: SchedulePolicy,
    pub rules: RulesPolicy,
    pub source: SourcePolicy,
    pub alerts: AlertsPolicy,
}

impl MonitorPolicy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            monitor: SchedulePolicy {
                interval: raw
                    .monitor
                    .interval_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_INTERVAL),
                check_on_start: raw.monitor.check_on_start.unwrap_or(true),
            },
            rules: RulesPolicy {
                hourly_allowance_hours: raw
                    .rules
                    .hourly_allowance_hours
                    .unwrap_or(DEFAULT_HOURLY_ALLOWANCE_HOURS),
                day_pass_window_end_hour: raw
                    .rules
                    .day_pass_window_end_hour
                    .unwrap_or(DEFAULT_DAY_PASS_WINDOW_END_HOUR),
            },
            source: SourcePolicy {
                slots_path: raw.source.slots_path.unwrap_or_else(default_slots_path),
            },
            alerts: AlertsPolicy {
                format: raw
                    .alerts
                    .format
                    .as_deref()
                    .and_then(|f| parse_alert_format(f).ok())
                    .unwrap_or_default(),
            },
        }
    }
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self {
            monitor: SchedulePolicy::default(),
            rules: RulesPolicy::default(),
            source: SourcePolicy {
                slots_path: default_slots_path(),
            },
            alerts: AlertsPolicy::default(),
        }
    }
}

/// Timer settings
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePolicy {
    pub interval: Duration,
    /// Run one check immediately when monitoring starts
    pub check_on_start: bool,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            check_on_start: true,
        }
    }
}

/// Overtime rule parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulesPolicy {
    pub hourly_allowance_hours: f64,
    pub day_pass_window_end_hour: u32,
}

impl Default for RulesPolicy {
    fn default() -> Self {
        Self {
            hourly_allowance_hours: DEFAULT_HOURLY_ALLOWANCE_HOURS,
            day_pass_window_end_hour: DEFAULT_DAY_PASS_WINDOW_END_HOUR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourcePolicy {
    pub slots_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertsPolicy {
    pub format: AlertFormat,
}

/// How the daemon emits alerts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlertFormat {
    /// Structured `tracing` events
    #[default]
    Log,
    /// One JSON event per line on stdout
    Json,
}
