//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("monitor.interval_seconds must be greater than 0")]
    ZeroInterval,

    #[error("rules.hourly_allowance_hours must be a positive number, got {0}")]
    InvalidAllowance(f64),

    #[error("rules.day_pass_window_end_hour must be 1-23, got {0}")]
    InvalidWindowEnd(u32),

    #[error("Unknown alert format '{0}' (expected \"log\" or \"json\")")]
    UnknownAlertFormat(String),

    #[error("source.slots_path cannot be empty")]
    EmptySlotsPath,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.monitor.interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroInterval);
    }

    if let Some(hours) = config.rules.hourly_allowance_hours
        && (!hours.is_finite() || hours <= 0.0)
    {
        errors.push(ValidationError::InvalidAllowance(hours));
    }

    if let Some(hour) = config.rules.day_pass_window_end_hour
        && !(1..=23).contains(&hour)
    {
        errors.push(ValidationError::InvalidWindowEnd(hour));
    }

    if let Some(format) = &config.alerts.format
        && parse_alert_format(format).is_err()
    {
        errors.push(ValidationError::UnknownAlertFormat(format.clone()));
    }

    if let Some(path) = &config.source.slots_path
        && path.as_os_str().is_empty()
    {
        errors.push(ValidationError::EmptySlotsPath);
    }

    errors
}

/// Parse an alert format name
pub fn parse_alert_format(s: &str) -> Result<crate::AlertFormat, String> {
    match s.trim().to_lowercase().as_str() {
        "log" => Ok(crate::AlertFormat::Log),
        "json" => Ok(crate::AlertFormat::Json),
        other => Err(format!("Unknown alert format: {}", other)),
    }
}
