//! Shared types for the parkwatch data model

use chrono::{DateTime, Utc};
use parkwatch_util::{format_hours, parse_flexible, SlotId};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Decode `T`, falling back to `T::default()` for null or ill-typed values.
///
/// One malformed session must not make the whole snapshot undecodable.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Other(IgnoredAny),
    }

    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => value,
        Lenient::Other(_) => T::default(),
    })
}

/// Billing plan of a parking session; selects the overtime rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingType {
    Hourly,
    DayPass,
    /// Anything the host sends that we do not recognize, null or missing
    /// included. Never overtime.
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for BillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BillingType::Hourly => "Hourly",
            BillingType::DayPass => "DayPass",
            BillingType::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Slot status as reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotStatus {
    Available,
    Occupied,
    #[default]
    #[serde(other)]
    Other,
}

/// Vehicle identity carried through to alerts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default, deserialize_with = "lenient")]
    pub number_plate: String,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub vehicle_type: String,
}

/// A parking session (host-owned, read-only here)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Entry time exactly as the host supplied it: a civil string
    /// (`DD/MM/YYYY, HH:MM:SS`) or an absolute timestamp. Empty when the
    /// host sent none, which makes the session unevaluable rather than the
    /// snapshot undecodable.
    #[serde(default, deserialize_with = "lenient")]
    pub entry_time: String,

    /// Set once the vehicle has left
    #[serde(default)]
    pub exit_time: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub billing_type: BillingType,

    #[serde(default, deserialize_with = "lenient")]
    pub vehicle: Vehicle,
}

impl Session {
    /// Whether the vehicle is still parked
    pub fn is_active(&self) -> bool {
        self.exit_time
            .as_deref()
            .is_none_or(|exit| exit.trim().is_empty())
    }

    /// Resolve the entry time to an absolute instant
    pub fn entry_instant(&self) -> parkwatch_util::Result<DateTime<Utc>> {
        parse_flexible(&self.entry_time)
    }
}

/// One parking slot in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    #[serde(default, deserialize_with = "lenient")]
    pub slot_number: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: SlotStatus,
    #[serde(default)]
    pub parking_sessions: Vec<Session>,
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        self.status == SlotStatus::Occupied
    }

    /// First session without an exit time, if any
    pub fn active_session(&self) -> Option<&Session> {
        self.parking_sessions.iter().find(|s| s.is_active())
    }
}

/// Payload shape of the host's slot listing (`{"slots": [...]}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotsPayload {
    #[serde(default)]
    pub slots: Vec<Slot>,
}

/// A session that is currently over its allowance. Regenerated every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeRecord {
    pub slot_id: SlotId,
    pub slot_number: String,
    pub vehicle_number_plate: String,
    pub vehicle_type: String,
    /// Entry time as supplied by the host
    pub entry_time: String,
    pub hours_parked: f64,
    /// Hours beyond the hourly allowance; always 0 for day passes
    pub overtime_hours: f64,
    pub billing_type: BillingType,
}

impl OvertimeRecord {
    /// One-line human readable alert text
    pub fn summary(&self) -> String {
        format!(
            "Overtime: vehicle {} in slot {} parked {} ({} over, {})",
            self.vehicle_number_plate,
            self.slot_number,
            format_hours(self.hours_parked),
            format_hours(self.overtime_hours),
            self.billing_type,
        )
    }
}

/// Scheduler status for display by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Instant of the last check that completed (timer, refresh or manual)
    pub last_check: Option<DateTime<Utc>>,
    /// Size of the current overtime set
    pub overtime_count: usize,
    /// Records dispatched to the alert sink since start
    pub alerts_dispatched: u64,
    /// Tick fetches that failed in a row; refreshes do not reset it
    pub consecutive_failures: u32,
}
