//! Error types for parkwatch

use thiserror::Error;

/// Core error type for parkwatch operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParkwatchError {
    #[error("Malformed time format '{input}': {reason}")]
    MalformedTimeFormat { input: String, reason: String },

    #[error("Snapshot fetch failed: {0}")]
    SnapshotFetch(String),
}

impl ParkwatchError {
    pub fn malformed_time(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTimeFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn snapshot_fetch(msg: impl Into<String>) -> Self {
        Self::SnapshotFetch(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ParkwatchError>;
