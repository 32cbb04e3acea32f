//! Injectable time source for cache expiry.

use std::sync::{Mutex, PoisonError};

use time::{Duration, OffsetDateTime};

use crate::UtcDateTime;

/// "Now" provider consulted by [`QuoteCache`](crate::QuoteCache).
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// Manually advanced clock for deterministic expiry tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: UtcDateTime) -> Self {
        Self {
            now: Mutex::new(start.into_inner()),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.saturating_add(Duration::try_from(by).unwrap_or(Duration::MAX));
    }

    pub fn set(&self, to: UtcDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to.into_inner();
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(UtcDateTime::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UtcDateTime {
        let now = *self.now.lock().unwrap_or_else(PoisonError::into_inner);
        UtcDateTime::from_offset_datetime(now).unwrap_or_else(|_| UtcDateTime::now())
    }
}
