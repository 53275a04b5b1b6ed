//! Host adapter traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkwatch_api::{AlertBatch, OvertimeRecord, Slot};
use thiserror::Error;

/// Errors from host-side operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    #[error("Snapshot decode failed: {0}")]
    Decode(String),

    #[error("Alert delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Pull-based source of slot snapshots.
///
/// Implementations must be idempotent and side-effect free from the
/// monitor's point of view. There is no timeout: a slow fetch only delays
/// the tick that issued it.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch the current list of slots
    async fn fetch_slots(&self) -> HostResult<Vec<Slot>>;

    /// Optional: short name used in logs
    fn describe(&self) -> String {
        "snapshot provider".into()
    }
}

/// Consumer of overtime alerts. Rendering and routing are up to the host.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Receive the records that became overtime during one tick (never empty)
    async fn notify(&self, batch: AlertBatch) -> HostResult<()>;

    /// Optional: receive the full current set after an out-of-band refresh
    async fn publish_current(
        &self,
        _computed_at: DateTime<Utc>,
        _records: &[OvertimeRecord],
    ) -> HostResult<()> {
        Ok(())
    }
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, honouring `PARKWATCH_MOCK_TIME` in debug builds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        parkwatch_util::now()
    }
}
