//! Time source for `lastUpdated` stamping.

use crate::model::timestamp::Timestamp;

/// Supplies the current instant. Swappable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
