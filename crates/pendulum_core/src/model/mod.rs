//! Domain model for pen-pals and their correspondence timeline.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep display metadata and transitions as static lookup tables.
//!
//! # Invariants
//! - Dates are Unix epoch milliseconds (`i64`).
//! - Stationery fields are token lists inside the domain.

pub mod event;
pub mod event_type;
pub mod letter_type;
pub mod penpal;
pub mod stationery;
pub mod validation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Returns `0` if the system clock is set before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
