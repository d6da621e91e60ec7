//! Collection metadata rows and storage trait.

use serde::{Deserialize, Serialize};

use crate::StoreError;
use xtdh_types::Partition;

/// Per-collection metadata consumed by the allocation engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub partition: Partition,
    /// Total minted supply; the denominator for `All`-mode grants.
    pub total_supply: u64,
    /// Base rate each held token of this collection produces per counted
    /// day, independent of any grant.
    pub base_daily_rate: f64,
}

/// Trait for collection metadata.
pub trait CollectionStore {
    fn put_collection(&self, meta: &CollectionMeta) -> Result<(), StoreError>;

    fn get_collection(&self, partition: &Partition) -> Result<Option<CollectionMeta>, StoreError>;

    /// Every known collection, ordered by partition.
    fn iter_collections(&self) -> Result<Vec<CollectionMeta>, StoreError>;
}
