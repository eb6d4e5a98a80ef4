//! Wall-clock adapter

use chrono::{DateTime, Utc};
use verity_application::ports::Clock;

/// `Clock` implementation backed by the real system time.
///
/// The engine takes its timestamps through the port, so tests substitute a
/// fixed clock while the binary wires in this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
