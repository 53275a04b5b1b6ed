//! Shared utilities for parkwatch
//!
//! This crate provides:
//! - ID types (SlotId)
//! - Civil time codec (fixed UTC+05:30 offset) and mock-able wall clock
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
