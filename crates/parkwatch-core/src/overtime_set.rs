//! Overtime set computation over a slot snapshot

use chrono::{DateTime, Utc};
use parkwatch_api::{OvertimeRecord, Slot};
use parkwatch_util::{ParkwatchError, SlotId};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::OvertimeRule;

/// A session left out of the computation because its entry time is unusable
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSession {
    pub slot_id: SlotId,
    pub error: ParkwatchError,
}

/// All sessions that are overtime at one instant.
///
/// Record order follows the snapshot and carries no meaning; use
/// [`OvertimeSet::sorted_by_slot`] when a stable order is needed.
#[derive(Debug, Clone, Default)]
pub struct OvertimeSet {
    records: Vec<OvertimeRecord>,
    skipped: Vec<SkippedSession>,
}

impl OvertimeSet {
    /// Evaluate every occupied slot's active session.
    ///
    /// Slots that are not occupied, or occupied without an active session,
    /// are ignored. When a slot lists several active sessions only the first
    /// is evaluated. A session whose entry time cannot be parsed is recorded
    /// in [`OvertimeSet::skipped`] and does not affect the others.
    pub fn compute(slots: &[Slot], now: DateTime<Utc>, rule: &OvertimeRule) -> Self {
        let mut set = Self::default();

        for slot in slots.iter().filter(|s| s.is_occupied()) {
            let Some(session) = slot.active_session() else {
                debug!(slot_id = %slot.id, "Occupied slot has no active session");
                continue;
            };

            let verdict = match rule.evaluate_session(session, now) {
                Ok(verdict) => verdict,
                Err(error) => {
                    warn!(
                        slot_id = %slot.id,
                        entry_time = %session.entry_time,
                        error = %error,
                        "Skipping session with unusable entry time"
                    );
                    set.skipped.push(SkippedSession {
                        slot_id: slot.id.clone(),
                        error,
                    });
                    continue;
                }
            };

            if !verdict.is_overtime {
                continue;
            }

            set.records.push(OvertimeRecord {
                slot_id: slot.id.clone(),
                slot_number: slot.slot_number.clone(),
                vehicle_number_plate: session.vehicle.number_plate.clone(),
                vehicle_type: session.vehicle.vehicle_type.clone(),
                entry_time: session.entry_time.clone(),
                hours_parked: verdict.hours_parked,
                overtime_hours: verdict.overtime_hours,
                billing_type: session.billing_type,
            });
        }

        set
    }

    pub fn records(&self) -> &[OvertimeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OvertimeRecord> {
        self.records
    }

    pub fn skipped(&self) -> &[SkippedSession] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, slot_id: &SlotId) -> bool {
        self.records.iter().any(|r| &r.slot_id == slot_id)
    }

    pub fn slot_ids(&self) -> HashSet<SlotId> {
        self.records.iter().map(|r| r.slot_id.clone()).collect()
    }

    /// Records ordered by slot id
    pub fn sorted_by_slot(&self) -> Vec<OvertimeRecord> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| a.slot_id.cmp(&b.slot_id));
        records
    }
}
