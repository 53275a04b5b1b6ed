//! Data model shared by the parkwatch crates
//!
//! This crate defines:
//! - Slot snapshots as handed over by the host (slots, sessions, vehicles)
//! - Overtime records derived from them
//! - Alert events delivered to sinks
//! - Versioning

mod events;
mod types;

pub use events::*;
pub use types::*;

/// Current event schema version
pub const API_VERSION: u32 = 1;
