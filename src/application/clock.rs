//! Time source seam so publication timestamps can be pinned in tests.

use std::sync::Mutex;

use time::{Duration, OffsetDateTime};

use crate::util::timestamp::truncate_to_millis;

pub trait Clock: Send + Sync {
    /// Current instant at the precision documents persist (milliseconds).
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        truncate_to_millis(OffsetDateTime::now_utc())
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            current: Mutex::new(truncate_to_millis(start)),
        }
    }

    pub fn set(&self, instant: OffsetDateTime) {
        *self.lock() = truncate_to_millis(instant);
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.lock();
        *guard = truncate_to_millis(*guard + by);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OffsetDateTime> {
        // The guarded value is a plain instant, so a poisoned lock is still usable.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.lock()
    }
}
