//! Periodic monitor driver
//!
//! Runs one [`OvertimeMonitor`] on a tokio task. Timer ticks, out-of-band
//! refreshes and manual checks all take the same async mutex, so a pass
//! never starts while another is still fetching, diffing or dispatching.

use chrono::{DateTime, Utc};
use parkwatch_api::{MonitorStatus, Slot};
use parkwatch_config::{MonitorPolicy, SchedulePolicy, DEFAULT_INTERVAL};
use parkwatch_host_api::{AlertSink, Clock, SnapshotProvider};
use parkwatch_util::{ParkwatchError, SlotId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{OvertimeMonitor, OvertimeRule, OvertimeSet, TickOutcome};

struct Shared {
    monitor: Mutex<OvertimeMonitor>,
    provider: Arc<dyn SnapshotProvider>,
    sink: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    async fn tick(&self) -> parkwatch_util::Result<TickOutcome> {
        let mut monitor = self.monitor.lock().await;
        let now = self.clock.now();
        monitor
            .tick(now, self.provider.as_ref(), self.sink.as_ref())
            .await
    }

    async fn evaluate(&self, slots: &[Slot], now: DateTime<Utc>) -> TickOutcome {
        let mut monitor = self.monitor.lock().await;
        let outcome = monitor.evaluate_now(slots, now);

        if let Some(batch) = outcome.alert_batch() {
            let count = batch.len();
            match self.sink.notify(batch).await {
                Ok(()) => monitor.record_dispatched(count),
                Err(e) => warn!(error = %e, count, "Failed to deliver overtime alerts"),
            }
        }

        outcome
    }

    async fn refresh(&self, slots: &[Slot]) -> OvertimeSet {
        let mut monitor = self.monitor.lock().await;
        let now = self.clock.now();
        let current = monitor.refresh(slots, now);

        if let Err(e) = self.sink.publish_current(now, current.records()).await {
            warn!(error = %e, "Failed to publish current overtime set");
        }

        current
    }

    async fn refresh_from_source(&self) -> parkwatch_util::Result<OvertimeSet> {
        let slots = self
            .provider
            .fetch_slots()
            .await
            .map_err(|e| ParkwatchError::snapshot_fetch(e.to_string()))?;
        Ok(self.refresh(&slots).await)
    }
}

/// Builder for a running monitor
pub struct MonitorScheduler {
    shared: Arc<Shared>,
    schedule: SchedulePolicy,
}

impl MonitorScheduler {
    /// A zero interval falls back to the default period.
    pub fn new(
        rule: OvertimeRule,
        mut schedule: SchedulePolicy,
        provider: Arc<dyn SnapshotProvider>,
        sink: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if schedule.interval.is_zero() {
            warn!(
                default_secs = DEFAULT_INTERVAL.as_secs(),
                "Zero check interval, using the default"
            );
            schedule.interval = DEFAULT_INTERVAL;
        }

        Self {
            shared: Arc::new(Shared {
                monitor: Mutex::new(OvertimeMonitor::new(rule)),
                provider,
                sink,
                clock,
            }),
            schedule,
        }
    }

    pub fn from_policy(
        policy: &MonitorPolicy,
        provider: Arc<dyn SnapshotProvider>,
        sink: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            OvertimeRule::from(policy.rules),
            policy.monitor.clone(),
            provider,
            sink,
            clock,
        )
    }

    /// Spawn the timer task. Must be called from within a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let refresh = Arc::new(Notify::new());

        info!(
            interval_secs = self.schedule.interval.as_secs(),
            check_on_start = self.schedule.check_on_start,
            source = %self.shared.provider.describe(),
            "Starting overtime monitor"
        );

        let task = tokio::spawn(run_loop(
            self.shared.clone(),
            self.schedule,
            shutdown_rx,
            refresh.clone(),
        ));

        SchedulerHandle {
            shared: self.shared,
            refresh,
            shutdown: shutdown_tx,
            task,
        }
    }
}

async fn run_loop(
    shared: Arc<Shared>,
    schedule: SchedulePolicy,
    mut shutdown: watch::Receiver<bool>,
    refresh: Arc<Notify>,
) {
    let first = if schedule.check_on_start {
        Instant::now()
    } else {
        Instant::now() + schedule.interval
    };
    let mut timer = interval_at(first, schedule.interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // Stop requested, or the handle was dropped
            _ = shutdown.changed() => break,

            _ = timer.tick() => {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    result = shared.tick() => {
                        if let Ok(outcome) = result {
                            debug!(
                                overtime = outcome.current.len(),
                                alerted = outcome.newly_overtime.len(),
                                "Tick complete"
                            );
                        }
                    }
                }
            }

            _ = refresh.notified() => {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    result = shared.refresh_from_source() => {
                        if let Err(e) = result {
                            warn!(error = %e, "Refresh skipped");
                        }
                    }
                }
            }
        }
    }

    info!("Overtime monitor stopped");
}

/// Control surface for a running monitor.
///
/// Dropping the handle stops the timer task as well.
pub struct SchedulerHandle {
    shared: Arc<Shared>,
    refresh: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Ask the timer task to recompute from a fresh snapshot without alerting.
    /// Requests made while one is pending coalesce.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Recompute from a snapshot the host already holds. Never alerts.
    pub async fn refresh_with_snapshot(&self, slots: &[Slot]) -> OvertimeSet {
        self.shared.refresh(slots).await
    }

    /// Run a full tick now, outside the timer cadence
    pub async fn check_now(&self) -> parkwatch_util::Result<TickOutcome> {
        self.shared.tick().await
    }

    /// Evaluate a host-supplied snapshot with the tick algorithm, alerts included
    pub async fn evaluate_now(&self, slots: &[Slot], now: DateTime<Utc>) -> TickOutcome {
        self.shared.evaluate(slots, now).await
    }

    pub async fn status(&self) -> MonitorStatus {
        self.shared.monitor.lock().await.status().clone()
    }

    pub async fn current_overtime_slot_ids(&self) -> HashSet<SlotId> {
        self.shared
            .monitor
            .lock()
            .await
            .previous_overtime_slot_ids()
            .clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the timer and wait for the task to exit.
    ///
    /// A tick in flight is abandoned; nothing is dispatched once this returns.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Monitor task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use async_trait::async_trait;
    use parkwatch_api::BillingType;
    use parkwatch_host_api::{
        mock_available_slot, mock_occupied_slot, HostResult, MockClock, MockSnapshotProvider,
        RecordingSink,
    };
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration as StdDuration;

    /// Provider whose fetches park until released, one release per fetch
    struct GatedProvider {
        slots: Vec<Slot>,
        gate: Notify,
        fetch_count: AtomicU64,
    }

    impl GatedProvider {
        fn new(slots: Vec<Slot>) -> Self {
            Self {
                slots,
                gate: Notify::new(),
                fetch_count: AtomicU64::new(0),
            }
        }

        fn release(&self) {
            self.gate.notify_one();
        }

        fn fetch_count(&self) -> u64 {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotProvider for GatedProvider {
        async fn fetch_slots(&self) -> HostResult<Vec<Slot>> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(self.slots.clone())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 25, 12, 0, 0).unwrap()
    }

    fn schedule(check_on_start: bool) -> SchedulePolicy {
        SchedulePolicy {
            interval: StdDuration::from_secs(300),
            check_on_start,
        }
    }

    struct Fixture {
        provider: Arc<MockSnapshotProvider>,
        sink: Arc<RecordingSink>,
        clock: Arc<MockClock>,
    }

    impl Fixture {
        fn new(slots: Vec<Slot>) -> Self {
            Self {
                provider: Arc::new(MockSnapshotProvider::new(slots)),
                sink: Arc::new(RecordingSink::new()),
                clock: Arc::new(MockClock::new(t0())),
            }
        }

        fn scheduler(&self, check_on_start: bool) -> MonitorScheduler {
            MonitorScheduler::new(
                OvertimeRule::default(),
                schedule(check_on_start),
                self.provider.clone(),
                self.sink.clone(),
                self.clock.clone(),
            )
        }
    }

    /// Let the spawned task run until it parks on the timer again
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_check_on_start() {
        let fx = Fixture::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]);
        let handle = fx.scheduler(true).start();
        settle().await;

        assert_eq!(fx.provider.fetch_count(), 1);
        assert_eq!(fx.sink.alerted_slot_ids(), vec![SlotId::new("a1")]);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_check_on_start_waits_one_interval() {
        let fx = Fixture::new(vec![]);
        let handle = fx.scheduler(false).start();
        settle().await;
        assert_eq!(fx.provider.fetch_count(), 0);

        tokio::time::sleep(StdDuration::from_secs(301)).await;
        settle().await;
        assert_eq!(fx.provider.fetch_count(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_ticks_alert_once() {
        let fx = Fixture::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]);
        let handle = fx.scheduler(true).start();
        settle().await;

        for _ in 0..3 {
            fx.clock.advance(Duration::minutes(5));
            tokio::time::sleep(StdDuration::from_secs(300)).await;
            settle().await;
        }

        assert_eq!(fx.provider.fetch_count(), 4);
        assert_eq!(fx.sink.batches().len(), 1);

        let status = handle.status().await;
        assert_eq!(status.last_check, Some(t0() + Duration::minutes(15)));
        assert_eq!(status.alerts_dispatched, 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let fx = Fixture::new(vec![]);
        let handle = fx.scheduler(true).start();
        settle().await;
        assert!(handle.is_running());

        handle.stop().await;

        tokio::time::sleep(StdDuration::from_secs(3600)).await;
        settle().await;
        assert_eq!(fx.provider.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_does_not_stop_scheduler() {
        let fx = Fixture::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]);
        fx.provider.set_fail(true);
        let handle = fx.scheduler(true).start();
        settle().await;

        assert!(fx.sink.batches().is_empty());
        assert_eq!(handle.status().await.consecutive_failures, 1);
        assert!(handle.current_overtime_slot_ids().await.is_empty());

        fx.provider.set_fail(false);
        tokio::time::sleep(StdDuration::from_secs(300)).await;
        settle().await;

        assert_eq!(fx.sink.alerted_slot_ids(), vec![SlotId::new("a1")]);
        assert_eq!(handle.status().await.consecutive_failures, 0);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_requested_refresh_publishes_without_alerting() {
        let fx = Fixture::new(vec![]);
        let handle = fx.scheduler(true).start();
        settle().await;

        fx.provider.set_slots(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]);
        handle.request_refresh();
        settle().await;

        assert!(fx.sink.batches().is_empty());
        assert_eq!(fx.sink.published().len(), 1);
        assert_eq!(fx.sink.published()[0].len(), 1);
        assert!(handle
            .current_overtime_slot_ids()
            .await
            .contains(&SlotId::new("a1")));

        // The next tick already knows about a1
        tokio::time::sleep(StdDuration::from_secs(300)).await;
        settle().await;
        assert!(fx.sink.batches().is_empty());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_with_snapshot_drops_departed_slots() {
        let fx = Fixture::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]);
        let handle = fx.scheduler(true).start();
        settle().await;
        assert_eq!(fx.sink.batches().len(), 1);

        let set = handle
            .refresh_with_snapshot(&[mock_available_slot("a1")])
            .await;
        assert!(set.is_empty());
        assert!(handle.current_overtime_slot_ids().await.is_empty());
        assert_eq!(fx.sink.batches().len(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_now_follows_dedupe() {
        let fx = Fixture::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]);
        let handle = fx.scheduler(false).start();
        settle().await;

        let first = handle.check_now().await.unwrap();
        assert_eq!(first.newly_overtime.len(), 1);

        let second = handle.check_now().await.unwrap();
        assert!(second.newly_overtime.is_empty());
        assert_eq!(fx.sink.batches().len(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_now_with_host_snapshot() {
        let fx = Fixture::new(vec![]);
        let handle = fx.scheduler(false).start();

        let slots = vec![mock_occupied_slot(
            "b7",
            t0() - Duration::hours(8),
            BillingType::Hourly,
        )];
        let outcome = handle.evaluate_now(&slots, t0()).await;
        assert_eq!(outcome.newly_overtime.len(), 1);
        assert_eq!(fx.sink.alerted_slot_ids(), vec![SlotId::new("b7")]);
        assert_eq!(fx.provider.fetch_count(), 0);

        let again = handle.evaluate_now(&slots, t0() + Duration::minutes(1)).await;
        assert!(again.newly_overtime.is_empty());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_policy_uses_rule_settings() {
        let fx = Fixture::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(3),
            BillingType::Hourly,
        )]);
        let mut policy = MonitorPolicy::default();
        policy.rules.hourly_allowance_hours = 2.0;

        let handle = MonitorScheduler::from_policy(
            &policy,
            fx.provider.clone(),
            fx.sink.clone(),
            fx.clock.clone(),
        )
        .start();
        settle().await;

        assert_eq!(fx.sink.alerted_slot_ids(), vec![SlotId::new("a1")]);
        handle.stop().await;
    }

    fn gated_scheduler(
        provider: Arc<GatedProvider>,
        sink: Arc<RecordingSink>,
    ) -> MonitorScheduler {
        MonitorScheduler::new(
            OvertimeRule::default(),
            schedule(true),
            provider,
            sink,
            Arc::new(MockClock::new(t0())),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_check_waits_for_tick_in_flight() {
        let provider = Arc::new(GatedProvider::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]));
        let sink = Arc::new(RecordingSink::new());
        let handle = gated_scheduler(provider.clone(), sink.clone()).start();
        settle().await;

        // Start-up tick is parked inside its fetch
        assert_eq!(provider.fetch_count(), 1);

        let (manual, ()) = tokio::join!(handle.check_now(), async {
            settle().await;
            // The manual check is queued behind the tick, not fetching
            assert_eq!(provider.fetch_count(), 1);
            provider.release();
            settle().await;
            provider.release();
        });

        let manual = manual.unwrap();
        assert!(manual.newly_overtime.is_empty());
        assert_eq!(manual.current.len(), 1);
        assert_eq!(provider.fetch_count(), 2);
        assert_eq!(sink.alerted_slot_ids(), vec![SlotId::new("a1")]);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_abandons_tick_in_flight() {
        let provider = Arc::new(GatedProvider::new(vec![mock_occupied_slot(
            "a1",
            t0() - Duration::hours(7),
            BillingType::Hourly,
        )]));
        let sink = Arc::new(RecordingSink::new());
        let handle = gated_scheduler(provider.clone(), sink.clone()).start();
        settle().await;
        assert_eq!(provider.fetch_count(), 1);

        handle.stop().await;

        provider.release();
        tokio::time::sleep(StdDuration::from_secs(600)).await;
        settle().await;

        assert!(sink.batches().is_empty());
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_uses_default() {
        let fx = Fixture::new(vec![]);
        let handle = MonitorScheduler::new(
            OvertimeRule::default(),
            SchedulePolicy {
                interval: StdDuration::ZERO,
                check_on_start: false,
            },
            fx.provider.clone(),
            fx.sink.clone(),
            fx.clock.clone(),
        )
        .start();

        tokio::time::sleep(StdDuration::from_secs(299)).await;
        settle().await;
        assert_eq!(fx.provider.fetch_count(), 0);

        tokio::time::sleep(StdDuration::from_secs(2)).await;
        settle().await;
        assert_eq!(fx.provider.fetch_count(), 1);

        handle.stop().await;
    }
}
