//! Overtime monitoring engine for parkwatch
//!
//! This crate is the heart of parkwatch, containing:
//! - Overtime rules per billing type (hourly allowance, day-pass night window)
//! - Overtime set computation over a slot snapshot
//! - Transition detection: each session is alerted once when it becomes overtime
//! - The periodic scheduler driving it all from a timer

mod monitor;
mod overtime_set;
mod rule;
mod scheduler;

pub use monitor::*;
pub use overtime_set::*;
pub use rule::*;
pub use scheduler::*;
