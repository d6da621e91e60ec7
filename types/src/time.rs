//! Timestamp type used throughout the engine.
//!
//! Timestamps are Unix epoch seconds (UTC). All day arithmetic is over
//! whole UTC day indexes — the recomputation cutoff is always the most
//! recent UTC day boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds in one UTC day.
pub const SECS_PER_DAY: u64 = 86_400;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    /// A timestamp at the start of the given UTC day index.
    pub fn from_days(days: u64) -> Self {
        Self(days * SECS_PER_DAY)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// The UTC day index this timestamp falls in.
    pub fn day(&self) -> u64 {
        self.0 / SECS_PER_DAY
    }

    /// The most recent UTC day boundary at or before this timestamp.
    pub fn day_floor(&self) -> Timestamp {
        Timestamp(self.0 - self.0 % SECS_PER_DAY)
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
