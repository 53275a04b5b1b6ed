//! Host seams for parkwatch
//!
//! This crate defines the interface between the monitor core and whatever
//! application hosts it: where slot snapshots come from, where alerts go and
//! what time it is. It contains no I/O itself; the mock implementations are
//! used by unit and integration tests.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
