//! Slot snapshots read from a JSON file

use async_trait::async_trait;
use parkwatch_api::{Slot, SlotsPayload};
use parkwatch_host_api::{HostError, HostResult, SnapshotProvider};
use std::path::PathBuf;
use tracing::debug;

/// Reads the `{"slots": [...]}` payload the dashboard serves, fresh on
/// every fetch.
pub struct FileSnapshotProvider {
    path: PathBuf,
}

impl FileSnapshotProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotProvider for FileSnapshotProvider {
    async fn fetch_slots(&self) -> HostResult<Vec<Slot>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            HostError::SnapshotUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let payload: SlotsPayload = serde_json::from_str(&content)
            .map_err(|e| HostError::Decode(format!("{}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), slots = payload.slots.len(), "Snapshot loaded");
        Ok(payload.slots)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
