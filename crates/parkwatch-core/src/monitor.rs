//! Transition detection between consecutive overtime sets

use chrono::{DateTime, Utc};
use parkwatch_api::{AlertBatch, MonitorStatus, OvertimeRecord, Slot};
use parkwatch_host_api::{AlertSink, SnapshotProvider};
use parkwatch_util::{ParkwatchError, SlotId};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::{OvertimeRule, OvertimeSet};

/// Result of one evaluation pass
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub checked_at: DateTime<Utc>,
    /// Everything overtime right now
    pub current: OvertimeSet,
    /// The subset that was not overtime at the previous evaluation
    pub newly_overtime: Vec<OvertimeRecord>,
}

impl TickOutcome {
    /// The alert batch for this pass, if anything crossed the threshold
    pub fn alert_batch(&self) -> Option<AlertBatch> {
        if self.newly_overtime.is_empty() {
            None
        } else {
            Some(AlertBatch::new(self.checked_at, self.newly_overtime.clone()))
        }
    }
}

/// Dedupe state for one monitor instance.
///
/// Holds the slot ids that were overtime at the previous evaluation. It
/// starts empty, so the first evaluation after start-up reports every slot
/// that is already overtime.
#[derive(Debug)]
pub struct OvertimeMonitor {
    rule: OvertimeRule,
    previous_overtime_slot_ids: HashSet<SlotId>,
    status: MonitorStatus,
}

impl OvertimeMonitor {
    pub fn new(rule: OvertimeRule) -> Self {
        Self {
            rule,
            previous_overtime_slot_ids: HashSet::new(),
            status: MonitorStatus::default(),
        }
    }

    pub fn rule(&self) -> &OvertimeRule {
        &self.rule
    }

    pub fn previous_overtime_slot_ids(&self) -> &HashSet<SlotId> {
        &self.previous_overtime_slot_ids
    }

    pub fn status(&self) -> &MonitorStatus {
        &self.status
    }

    /// Evaluate a snapshot and advance the dedupe state.
    ///
    /// Returns the current overtime set together with the records whose slot
    /// was not overtime at the previous evaluation. Afterwards the previous
    /// set is exactly the slot ids of the current one, so a slot that leaves
    /// overtime (vehicle gone) and later re-enters it is reported again.
    pub fn evaluate_now(&mut self, slots: &[Slot], now: DateTime<Utc>) -> TickOutcome {
        let current = OvertimeSet::compute(slots, now, &self.rule);

        let newly_overtime: Vec<OvertimeRecord> = current
            .records()
            .iter()
            .filter(|r| !self.previous_overtime_slot_ids.contains(&r.slot_id))
            .cloned()
            .collect();

        self.previous_overtime_slot_ids = current.slot_ids();
        self.mark_checked(now, current.len());

        debug!(
            overtime = current.len(),
            newly_overtime = newly_overtime.len(),
            skipped = current.skipped().len(),
            "Overtime evaluation complete"
        );

        TickOutcome {
            checked_at: now,
            current,
            newly_overtime,
        }
    }

    /// Recompute after the host reports an out-of-band snapshot change.
    ///
    /// Replaces the previous set with the current one and never reports
    /// anything as newly overtime.
    pub fn refresh(&mut self, slots: &[Slot], now: DateTime<Utc>) -> OvertimeSet {
        let current = OvertimeSet::compute(slots, now, &self.rule);
        self.previous_overtime_slot_ids = current.slot_ids();
        self.mark_checked(now, current.len());

        debug!(overtime = current.len(), "Overtime set refreshed");

        current
    }

    /// One full tick: fetch, evaluate, dispatch.
    ///
    /// A failed fetch aborts the tick with the dedupe state untouched. A
    /// failed delivery is logged; the dedupe state has already moved on, so
    /// those alerts are not retried.
    pub async fn tick(
        &mut self,
        now: DateTime<Utc>,
        provider: &dyn SnapshotProvider,
        sink: &dyn AlertSink,
    ) -> parkwatch_util::Result<TickOutcome> {
        let slots = match provider.fetch_slots().await {
            Ok(slots) => slots,
            Err(e) => {
                self.status.consecutive_failures += 1;
                error!(
                    source = %provider.describe(),
                    error = %e,
                    consecutive_failures = self.status.consecutive_failures,
                    "Snapshot fetch failed, skipping tick"
                );
                return Err(ParkwatchError::snapshot_fetch(e.to_string()));
            }
        };

        self.status.consecutive_failures = 0;
        let outcome = self.evaluate_now(&slots, now);

        if let Some(batch) = outcome.alert_batch() {
            for record in &batch.records {
                info!(
                    slot_id = %record.slot_id,
                    vehicle = %record.vehicle_number_plate,
                    billing_type = %record.billing_type,
                    hours_parked = record.hours_parked,
                    "Vehicle entered overtime"
                );
            }

            let count = batch.len();
            match sink.notify(batch).await {
                Ok(()) => self.record_dispatched(count),
                Err(e) => warn!(error = %e, count, "Failed to deliver overtime alerts"),
            }
        }

        Ok(outcome)
    }

    /// Count records the sink accepted
    pub fn record_dispatched(&mut self, count: usize) {
        self.status.alerts_dispatched += count as u64;
    }

    fn mark_checked(&mut self, now: DateTime<Utc>, overtime_count: usize) {
        self.status.last_check = Some(now);
        self.status.overtime_count = overtime_count;
    }
}
