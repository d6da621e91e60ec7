//! Ownership history rows and storage trait.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::StoreError;
use xtdh_types::{Partition, TokenId, Timestamp, WalletAddress};

/// One observed change of custody of one token.
///
/// Produced by the external log-tailing indexer; append-only and never
/// mutated by this engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipEvent {
    pub partition: Partition,
    pub token_id: TokenId,
    pub owner: WalletAddress,
    /// When the new owner acquired the token.
    pub since_time: Timestamp,
    /// Block number, for tie-breaking events within one second.
    pub since_block: u64,
    /// Log position within the block, the final tie-breaker.
    pub log_index: u64,
    /// Whether custody changed via a monetary sale (vs. a free transfer
    /// or airdrop).
    pub acquired_as_sale: bool,
}

impl OwnershipEvent {
    /// Total ordering key: newest wins on `(since_time, since_block,
    /// log_index)`.
    pub fn ordering_key(&self) -> (Timestamp, u64, u64) {
        (self.since_time, self.since_block, self.log_index)
    }
}

/// Trait for the append-only ownership history feed.
pub trait OwnershipStore {
    /// Append one event. Writers are the external indexer and test setup;
    /// the engine itself only reads.
    fn put_event(&self, event: &OwnershipEvent) -> Result<(), StoreError>;

    /// Every recorded event, in `(partition, token, ordering_key)` order.
    fn iter_events(&self) -> Result<Vec<OwnershipEvent>, StoreError>;

    /// Every recorded event for one partition, in `(token, ordering_key)`
    /// order.
    fn iter_partition_events(&self, partition: &Partition) -> Result<Vec<OwnershipEvent>, StoreError>;

    /// Every distinct wallet address that appears in the history.
    fn observed_wallets(&self) -> Result<Vec<WalletAddress>, StoreError> {
        let mut wallets = BTreeSet::new();
        for event in self.iter_events()? {
            wallets.insert(event.owner);
        }
        Ok(wallets.into_iter().collect())
    }
}
