//! Nullable clock — deterministic time for testing.

use std::sync::atomic::{AtomicU64, Ordering};

use xtdh_types::Timestamp;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    /// Start the clock at the beginning of the given UTC day.
    pub fn at_day(day: u64) -> Self {
        Self::new(Timestamp::from_days(day).as_secs())
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::Relaxed))
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::Relaxed);
    }

    /// Advance time by a number of whole days.
    pub fn advance_days(&self, days: u64) {
        self.advance(days * xtdh_types::SECS_PER_DAY);
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_advances_when_told() {
        let clock = NullClock::at_day(3);
        assert_eq!(clock.now().day(), 3);
        clock.advance_days(2);
        assert_eq!(clock.now().day(), 5);
        clock.advance(1);
        assert_eq!(clock.now().day(), 5);
    }
}
