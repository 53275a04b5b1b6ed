//! Alert events produced by the monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OvertimeRecord, API_VERSION};

/// The records that became overtime during one tick.
///
/// Never empty when handed to a sink. Records keep snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertBatch {
    /// Timestamp of the tick that produced the batch
    pub checked_at: DateTime<Utc>,
    pub records: Vec<OvertimeRecord>,
}

impl AlertBatch {
    pub fn new(checked_at: DateTime<Utc>, records: Vec<OvertimeRecord>) -> Self {
        Self { checked_at, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: parkwatch_util::now(),
            payload,
        }
    }
}

/// Everything the monitor hands outward
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Sessions that crossed into overtime
    OvertimeAlert(AlertBatch),

    /// Full current overtime set, published after an out-of-band refresh
    OvertimeSet {
        computed_at: DateTime<Utc>,
        records: Vec<OvertimeRecord>,
    },
}
