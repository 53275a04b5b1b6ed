//! Time utilities for parkwatch
//!
//! All threshold logic runs on absolute instants (`DateTime<Utc>`). Calendar
//! questions ("which day did this vehicle enter?") are answered in civil time:
//! a fixed UTC+05:30 offset that never depends on the host's locale or
//! timezone settings.
//!
//! The civil text format is `DD/MM/YYYY, HH:MM:SS` (24-hour clock, zero padded).
//!
//! # Mock Time for Development
//!
//! In debug builds, the `PARKWATCH_MOCK_TIME` environment variable can be set
//! to override the current time. The value is read as civil time and advances
//! at the same rate as real time from process start.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 03:30:00`)
//!
//! Example:
//! ```bash
//! PARKWATCH_MOCK_TIME="2025-12-26 03:00:00" parkwatchd --once
//! ```

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use std::sync::OnceLock;
use tracing::debug;

use crate::{ParkwatchError, Result};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "PARKWATCH_MOCK_TIME";

/// Civil offset east of UTC, in seconds (+05:30)
pub const CIVIL_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// strftime pattern of the civil text format
pub const CIVIL_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Timestamp layouts accepted by the generic fallback when no offset is given.
/// Values without an offset are read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    // Month-first, only reached when the day-first civil parse fails
    "%m/%d/%Y, %H:%M:%S",
];

/// Bare date layouts, read as UTC midnight
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Near misses of the civil format (missing comma, missing seconds).
/// Read on the civil clock.
const LOOSE_CIVIL_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y,%H:%M:%S",
    "%d/%m/%Y, %H:%M",
];

/// Cached mock time offset from the real time when the process started.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Utc::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S")
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = "%Y-%m-%d %H:%M:%S",
                    "Invalid mock time format"
                );
                return None;
            };
            let mock_dt = civil_offset().from_local_datetime(&naive_dt).single()?;
            let offset = mock_dt.with_timezone(&Utc).signed_duration_since(Utc::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current instant, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// The fixed civil offset (UTC+05:30)
pub fn civil_offset() -> FixedOffset {
    FixedOffset::east_opt(CIVIL_OFFSET_SECONDS).expect("+05:30 is within +/-24h")
}

/// View an instant on the civil clock
pub fn to_civil(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&civil_offset())
}

/// Civil calendar date of an instant
pub fn civil_date(instant: DateTime<Utc>) -> NaiveDate {
    to_civil(instant).date_naive()
}

/// Civil hour-of-day (0..=23) of an instant
pub fn civil_hour(instant: DateTime<Utc>) -> u32 {
    to_civil(instant).hour()
}

/// Format an instant as `DD/MM/YYYY, HH:MM:SS` in civil time
pub fn to_civil_string(instant: DateTime<Utc>) -> String {
    to_civil(instant).format(CIVIL_FORMAT).to_string()
}

/// Parse a `DD/MM/YYYY, HH:MM:SS` civil string into an absolute instant.
///
/// Only that exact shape is accepted: two fields separated by `", "`, a
/// three-part `/` date and a three-part `:` time, all numeric and naming a
/// real calendar date and clock time.
pub fn parse_civil_string(text: &str) -> Result<DateTime<Utc>> {
    let fields: Vec<&str> = text.split(", ").collect();
    if fields.len() != 2 {
        return Err(ParkwatchError::malformed_time(
            text,
            "expected \"DD/MM/YYYY, HH:MM:SS\"",
        ));
    }

    let date_parts: Vec<&str> = fields[0].split('/').collect();
    let time_parts: Vec<&str> = fields[1].split(':').collect();
    if date_parts.len() != 3 || time_parts.len() != 3 {
        return Err(ParkwatchError::malformed_time(
            text,
            "date must be DD/MM/YYYY and time HH:MM:SS",
        ));
    }

    let day: u32 = parse_component(text, date_parts[0], "day")?;
    let month: u32 = parse_component(text, date_parts[1], "month")?;
    let year: i32 = parse_component(text, date_parts[2], "year")?;
    let hour: u32 = parse_component(text, time_parts[0], "hour")?;
    let minute: u32 = parse_component(text, time_parts[1], "minute")?;
    let second: u32 = parse_component(text, time_parts[2], "second")?;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ParkwatchError::malformed_time(text, "no such calendar date"))?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| ParkwatchError::malformed_time(text, "no such clock time"))?;

    civil_offset()
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ParkwatchError::malformed_time(text, "ambiguous civil time"))
}

fn parse_component<T: std::str::FromStr>(text: &str, part: &str, name: &str) -> Result<T> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParkwatchError::malformed_time(
            text,
            format!("{name} is not a number"),
        ));
    }
    part.parse::<T>()
        .map_err(|_| ParkwatchError::malformed_time(text, format!("{name} is out of range")))
}

/// Parse either representation an upstream system may hand us.
///
/// Text containing `/` is tried as a civil string first. Anything else, or a
/// civil string that fails to parse, goes through generic absolute-timestamp
/// parsing: RFC 3339, RFC 2822, civil text missing its comma or seconds,
/// `-` or `/` separated timestamps without offset as UTC, bare dates as UTC
/// midnight. Only when every attempt fails is `MalformedTimeFormat` returned.
pub fn parse_flexible(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();

    if trimmed.contains('/') {
        match parse_civil_string(trimmed) {
            Ok(instant) => return Ok(instant),
            Err(err) => {
                debug!(input = %trimmed, error = %err, "Civil parse failed, trying generic formats");
            }
        }
    }

    parse_generic(trimmed).ok_or_else(|| {
        ParkwatchError::malformed_time(text, "neither a civil time string nor a recognized timestamp")
    })
}

fn parse_generic(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in LOOSE_CIVIL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            if let Some(dt) = civil_offset().from_local_datetime(&naive).single() {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NAIVE_DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

/// Elapsed time between two instants in fractional hours (negative if `to` is earlier)
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    to.signed_duration_since(from).num_milliseconds() as f64 / 3_600_000.0
}

/// Render a number of hours with one decimal, e.g. `7.3h`
pub fn format_hours(hours: f64) -> String {
    format!("{:.1}h", hours)
}
