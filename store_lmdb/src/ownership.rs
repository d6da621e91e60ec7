//! LMDB implementation of OwnershipStore.

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{OwnershipEvent, OwnershipStore, StoreError};
use xtdh_types::Partition;

/// Composite key: `partition / token_id / since_time / since_block /
/// log_index`, numeric parts big-endian. Partitions are hex strings, so
/// the `/` separator sorts below every partition character and events
/// iterate in `(partition, token, ordering_key)` order.
fn event_key(event: &OwnershipEvent) -> Vec<u8> {
    let mut key = Vec::with_capacity(event.partition.as_str().len() + 33);
    key.extend_from_slice(event.partition.as_str().as_bytes());
    key.push(b'/');
    key.extend_from_slice(&event.token_id.as_u64().to_be_bytes());
    key.extend_from_slice(&event.since_time.as_secs().to_be_bytes());
    key.extend_from_slice(&event.since_block.to_be_bytes());
    key.extend_from_slice(&event.log_index.to_be_bytes());
    key
}

impl OwnershipStore for LmdbStore {
    fn put_event(&self, event: &OwnershipEvent) -> Result<(), StoreError> {
        let bytes = bincode::serialize(event)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.events_db
            .put(&mut wtxn, &event_key(event), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_events(&self) -> Result<Vec<OwnershipEvent>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self.events_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut events = Vec::new();
        for entry in iter {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            events.push(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            );
        }
        Ok(events)
    }

    fn iter_partition_events(&self, partition: &Partition) -> Result<Vec<OwnershipEvent>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut prefix = partition.as_str().as_bytes().to_vec();
        prefix.push(b'/');
        let iter = self
            .events_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut events = Vec::new();
        for entry in iter {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            events.push(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            );
        }
        Ok(events)
    }
}
