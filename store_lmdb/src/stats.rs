//! LMDB implementation of StatsStore.
//!
//! Each stats slot is a pair of named databases (`grant_stats_a/b`,
//! `token_stats_a/b`); the active-slot marker lives in the meta database
//! and is flipped in its own single-key write transaction, which is what
//! makes promotion atomic for readers.

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{meta, GrantRateStat, MetaStore, StatsSlot, StatsStore, StoreError, TokenRateStat};

fn token_stat_key(stat: &TokenRateStat) -> Vec<u8> {
    let mut key = Vec::with_capacity(stat.partition.as_str().len() + 9);
    key.extend_from_slice(stat.partition.as_str().as_bytes());
    key.push(b'/');
    key.extend_from_slice(&stat.token_id.as_u64().to_be_bytes());
    key
}

impl StatsStore for LmdbStore {
    fn active_slot(&self) -> Result<StatsSlot, StoreError> {
        match self.get_meta(meta::ACTIVE_SLOT_KEY)? {
            Some(bytes) if bytes == b"b" => Ok(StatsSlot::B),
            _ => Ok(StatsSlot::A),
        }
    }

    fn activate_slot(&self, slot: StatsSlot) -> Result<(), StoreError> {
        self.put_meta(meta::ACTIVE_SLOT_KEY, slot.as_str().as_bytes())
    }

    fn clear_slot(&self, slot: StatsSlot) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.grant_stats_db(slot)
            .clear(&mut wtxn)
            .map_err(LmdbError::from)?;
        self.token_stats_db(slot)
            .clear(&mut wtxn)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_grant_stat(&self, slot: StatsSlot, stat: &GrantRateStat) -> Result<(), StoreError> {
        let bytes = bincode::serialize(stat)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.grant_stats_db(slot)
            .put(&mut wtxn, &stat.grant_id.as_u64().to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_token_stat(&self, slot: StatsSlot, stat: &TokenRateStat) -> Result<(), StoreError> {
        let bytes = bincode::serialize(stat)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.token_stats_db(slot)
            .put(&mut wtxn, &token_stat_key(stat), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_grant_stats(&self, slot: StatsSlot) -> Result<Vec<GrantRateStat>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self
            .grant_stats_db(slot)
            .iter(&rtxn)
            .map_err(LmdbError::from)?;
        let mut stats = Vec::new();
        for entry in iter {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            stats.push(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            );
        }
        Ok(stats)
    }

    fn iter_token_stats(&self, slot: StatsSlot) -> Result<Vec<TokenRateStat>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self
            .token_stats_db(slot)
            .iter(&rtxn)
            .map_err(LmdbError::from)?;
        let mut stats = Vec::new();
        for entry in iter {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            stats.push(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            );
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xtdh_types::{GrantId, IdentityId, Partition, TokenId};

    #[test]
    fn slots_are_independent_and_marker_flips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).unwrap();
        assert_eq!(store.active_slot().unwrap(), StatsSlot::A);

        let stat = GrantRateStat {
            grant_id: GrantId::new(1),
            grantor: IdentityId::new(9),
            partition: Partition::new("0xc0ffee"),
            daily_rate: 12.5,
        };
        store.put_grant_stat(StatsSlot::B, &stat).unwrap();
        store
            .put_token_stat(
                StatsSlot::B,
                &TokenRateStat {
                    partition: Partition::new("0xc0ffee"),
                    token_id: TokenId::new(1),
                    daily_rate: 12.5,
                },
            )
            .unwrap();

        assert!(store.iter_grant_stats(StatsSlot::A).unwrap().is_empty());
        assert_eq!(store.iter_grant_stats(StatsSlot::B).unwrap(), vec![stat]);

        store.activate_slot(StatsSlot::B).unwrap();
        assert_eq!(store.active_slot().unwrap(), StatsSlot::B);

        store.clear_slot(StatsSlot::B).unwrap();
        assert!(store.iter_grant_stats(StatsSlot::B).unwrap().is_empty());
        assert!(store.iter_token_stats(StatsSlot::B).unwrap().is_empty());
    }
}
