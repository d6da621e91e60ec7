//! Materialized stats rows, slot marker, and storage trait.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::StoreError;
use xtdh_types::{GrantId, IdentityId, Partition, TokenId};

/// One of the two alternating materialized-stats storage areas.
///
/// Exactly one slot is active at a time; the materializer rebuilds the
/// inactive slot and then atomically promotes it. Readers resolve
/// [`StatsStore::active_slot`] first and read from that slot only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsSlot {
    A,
    B,
}

impl StatsSlot {
    /// The slot that is not `self` — the rebuild target while `self` serves.
    pub fn other(self) -> StatsSlot {
        match self {
            StatsSlot::A => StatsSlot::B,
            StatsSlot::B => StatsSlot::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatsSlot::A => "a",
            StatsSlot::B => "b",
        }
    }
}

impl fmt::Display for StatsSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Materialized per-grant daily-rate snapshot row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrantRateStat {
    pub grant_id: GrantId,
    pub grantor: IdentityId,
    pub partition: Partition,
    /// Effective daily outflow of this grant at the snapshot cutoff.
    pub daily_rate: f64,
}

/// Materialized per-token daily-rate snapshot row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenRateStat {
    pub partition: Partition,
    pub token_id: TokenId,
    /// Summed daily rate flowing to the holder of this token across all
    /// eligible grants.
    pub daily_rate: f64,
}

/// Trait for the double-buffered stats snapshot.
pub trait StatsStore {
    /// The currently active slot. Defaults to [`StatsSlot::A`] before the
    /// first activation.
    fn active_slot(&self) -> Result<StatsSlot, StoreError>;

    /// Atomically promote `slot` to active.
    fn activate_slot(&self, slot: StatsSlot) -> Result<(), StoreError>;

    /// Remove every stat row from `slot` ahead of a rebuild.
    fn clear_slot(&self, slot: StatsSlot) -> Result<(), StoreError>;

    fn put_grant_stat(&self, slot: StatsSlot, stat: &GrantRateStat) -> Result<(), StoreError>;

    fn put_token_stat(&self, slot: StatsSlot, stat: &TokenRateStat) -> Result<(), StoreError>;

    /// Every grant stat in `slot`, ordered by grant id.
    fn iter_grant_stats(&self, slot: StatsSlot) -> Result<Vec<GrantRateStat>, StoreError>;

    /// Every token stat in `slot`, ordered by `(partition, token)`.
    fn iter_token_stats(&self, slot: StatsSlot) -> Result<Vec<TokenRateStat>, StoreError>;
}
