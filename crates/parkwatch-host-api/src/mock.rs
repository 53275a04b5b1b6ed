//! Mock host seams for testing

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parkwatch_api::{AlertBatch, BillingType, OvertimeRecord, Session, Slot, SlotStatus, Vehicle};
use parkwatch_util::{to_civil_string, SlotId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::{AlertSink, Clock, HostError, HostResult, SnapshotProvider};

/// Build an occupied slot with one active session entered at `entry`.
/// The entry time is written in civil text form, as the dashboard stores it.
pub fn mock_occupied_slot(
    id: &str,
    entry: DateTime<Utc>,
    billing_type: BillingType,
) -> Slot {
    Slot {
        id: SlotId::new(id),
        slot_number: id.to_uppercase(),
        status: SlotStatus::Occupied,
        parking_sessions: vec![mock_session(&format!("PL-{id}"), entry, billing_type)],
    }
}

/// Build an active session for `plate`
pub fn mock_session(plate: &str, entry: DateTime<Utc>, billing_type: BillingType) -> Session {
    Session {
        entry_time: to_civil_string(entry),
        exit_time: None,
        billing_type,
        vehicle: Vehicle {
            number_plate: plate.to_string(),
            vehicle_type: "Car".into(),
        },
    }
}

/// Build an empty, available slot
pub fn mock_available_slot(id: &str) -> Slot {
    Slot {
        id: SlotId::new(id),
        slot_number: id.to_uppercase(),
        status: SlotStatus::Available,
        parking_sessions: vec![],
    }
}

/// Snapshot provider serving a settable slot list
#[derive(Default)]
pub struct MockSnapshotProvider {
    slots: Arc<Mutex<Vec<Slot>>>,
    fetch_count: AtomicU64,

    /// Configure fetch to fail
    pub fail_fetch: Arc<Mutex<bool>>,
}

impl MockSnapshotProvider {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(slots)),
            ..Default::default()
        }
    }

    /// Replace the slot list served by subsequent fetches
    pub fn set_slots(&self, slots: Vec<Slot>) {
        *self.slots.lock().unwrap() = slots;
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }

    /// Number of fetch attempts, failed ones included
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotProvider for MockSnapshotProvider {
    async fn fetch_slots(&self) -> HostResult<Vec<Slot>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if *self.fail_fetch.lock().unwrap() {
            return Err(HostError::SnapshotUnavailable("Mock fetch failure".into()));
        }

        Ok(self.slots.lock().unwrap().clone())
    }

    fn describe(&self) -> String {
        "mock".into()
    }
}

/// Alert sink that records everything it receives
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<AlertBatch>>,
    published: Mutex<Vec<Vec<OvertimeRecord>>>,

    /// Configure notify to fail
    pub fail_notify: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All alert batches received so far
    pub fn batches(&self) -> Vec<AlertBatch> {
        self.batches.lock().unwrap().clone()
    }

    /// Slot ids across all alert batches, in delivery order
    pub fn alerted_slot_ids(&self) -> Vec<SlotId> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.records.iter().map(|r| r.slot_id.clone()))
            .collect()
    }

    /// All sets received through `publish_current`
    pub fn published(&self) -> Vec<Vec<OvertimeRecord>> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn notify(&self, batch: AlertBatch) -> HostResult<()> {
        if *self.fail_notify.lock().unwrap() {
            return Err(HostError::DeliveryFailed("Mock delivery failure".into()));
        }
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }

    async fn publish_current(
        &self,
        _computed_at: DateTime<Utc>,
        records: &[OvertimeRecord],
    ) -> HostResult<()> {
        self.published.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}

/// Settable clock
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
