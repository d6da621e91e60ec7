//! Nullable store — thread-safe in-memory storage for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use xtdh_store::{
    meta, BalanceStore, CollectionMeta, CollectionStore, ConsolidationStore, Grant, GrantRateStat,
    GrantStore, GrantTokenRow, IdentityBalance, IdentityStore, MetaStore, OwnershipEvent,
    OwnershipStore, StatsSlot, StatsStore, StoreError, TokenRateStat,
};
use xtdh_types::{ConsolidationKey, GrantId, IdentityId, Partition, TokenId, WalletAddress};

/// An in-memory implementation of every storage trait.
///
/// Thread-safe and ordered (B-trees throughout), so iteration order
/// matches what the LMDB backend produces. Balance replacement is atomic
/// under the balances mutex, mirroring the backend's single write
/// transaction.
pub struct MemoryStore {
    grants: Mutex<BTreeMap<GrantId, Grant>>,
    grant_tokens: Mutex<BTreeMap<GrantId, Vec<TokenId>>>,
    events: Mutex<Vec<OwnershipEvent>>,
    consolidation: Mutex<BTreeMap<WalletAddress, ConsolidationKey>>,
    identities: Mutex<BTreeMap<ConsolidationKey, IdentityId>>,
    collections: Mutex<BTreeMap<Partition, CollectionMeta>>,
    balances: Mutex<BTreeMap<IdentityId, IdentityBalance>>,
    grant_stats: Mutex<BTreeMap<(u8, GrantId), GrantRateStat>>,
    token_stats: Mutex<BTreeMap<(u8, Partition, TokenId), TokenRateStat>>,
    metadata: Mutex<BTreeMap<String, Vec<u8>>>,
}

fn slot_tag(slot: StatsSlot) -> u8 {
    match slot {
        StatsSlot::A => 0,
        StatsSlot::B => 1,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            grants: Mutex::new(BTreeMap::new()),
            grant_tokens: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
            consolidation: Mutex::new(BTreeMap::new()),
            identities: Mutex::new(BTreeMap::new()),
            collections: Mutex::new(BTreeMap::new()),
            balances: Mutex::new(BTreeMap::new()),
            grant_stats: Mutex::new(BTreeMap::new()),
            token_stats: Mutex::new(BTreeMap::new()),
            metadata: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GrantStore for MemoryStore {
    fn put_grant(&self, grant: &Grant) -> Result<(), StoreError> {
        self.grants.lock().unwrap().insert(grant.id, grant.clone());
        Ok(())
    }

    fn get_grant(&self, id: GrantId) -> Result<Option<Grant>, StoreError> {
        Ok(self.grants.lock().unwrap().get(&id).cloned())
    }

    fn iter_grants(&self) -> Result<Vec<Grant>, StoreError> {
        Ok(self.grants.lock().unwrap().values().cloned().collect())
    }

    fn put_grant_token(&self, row: &GrantTokenRow) -> Result<(), StoreError> {
        let mut tokens = self.grant_tokens.lock().unwrap();
        let entry = tokens.entry(row.grant_id).or_default();
        if !entry.contains(&row.token_id) {
            entry.push(row.token_id);
            entry.sort();
        }
        Ok(())
    }

    fn grant_tokens(&self, id: GrantId) -> Result<Vec<TokenId>, StoreError> {
        Ok(self
            .grant_tokens
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

impl OwnershipStore for MemoryStore {
    fn put_event(&self, event: &OwnershipEvent) -> Result<(), StoreError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn iter_events(&self) -> Result<Vec<OwnershipEvent>, StoreError> {
        let mut events = self.events.lock().unwrap().clone();
        events.sort_by(|a, b| {
            (&a.partition, a.token_id, a.ordering_key())
                .cmp(&(&b.partition, b.token_id, b.ordering_key()))
        });
        Ok(events)
    }

    fn iter_partition_events(&self, partition: &Partition) -> Result<Vec<OwnershipEvent>, StoreError> {
        Ok(self
            .iter_events()?
            .into_iter()
            .filter(|e| &e.partition == partition)
            .collect())
    }
}

impl ConsolidationStore for MemoryStore {
    fn put_mapping(&self, wallet: &WalletAddress, key: &ConsolidationKey) -> Result<(), StoreError> {
        self.consolidation
            .lock()
            .unwrap()
            .insert(wallet.clone(), key.clone());
        Ok(())
    }

    fn get_key(&self, wallet: &WalletAddress) -> Result<Option<ConsolidationKey>, StoreError> {
        Ok(self.consolidation.lock().unwrap().get(wallet).cloned())
    }

    fn iter_mappings(&self) -> Result<Vec<(WalletAddress, ConsolidationKey)>, StoreError> {
        Ok(self
            .consolidation
            .lock()
            .unwrap()
            .iter()
            .map(|(w, k)| (w.clone(), k.clone()))
            .collect())
    }
}

impl IdentityStore for MemoryStore {
    fn get_identity(&self, key: &ConsolidationKey) -> Result<Option<IdentityId>, StoreError> {
        Ok(self.identities.lock().unwrap().get(key).copied())
    }

    fn ensure_identity(&self, key: &ConsolidationKey) -> Result<IdentityId, StoreError> {
        let mut identities = self.identities.lock().unwrap();
        if let Some(&existing) = identities.get(key) {
            return Ok(existing);
        }
        let mut metadata = self.metadata.lock().unwrap();
        let next = metadata
            .get(meta::NEXT_IDENTITY_KEY)
            .map(|bytes| decode_u64(bytes))
            .transpose()?
            .unwrap_or(1);
        metadata.insert(meta::NEXT_IDENTITY_KEY.to_string(), (next + 1).to_be_bytes().to_vec());
        let identity = IdentityId::new(next);
        identities.insert(key.clone(), identity);
        Ok(identity)
    }

    fn iter_identities(&self) -> Result<Vec<(ConsolidationKey, IdentityId)>, StoreError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .map(|(k, &id)| (k.clone(), id))
            .collect())
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        Ok(self.identities.lock().unwrap().len() as u64)
    }
}

impl CollectionStore for MemoryStore {
    fn put_collection(&self, meta: &CollectionMeta) -> Result<(), StoreError> {
        self.collections
            .lock()
            .unwrap()
            .insert(meta.partition.clone(), meta.clone());
        Ok(())
    }

    fn get_collection(&self, partition: &Partition) -> Result<Option<CollectionMeta>, StoreError> {
        Ok(self.collections.lock().unwrap().get(partition).cloned())
    }

    fn iter_collections(&self) -> Result<Vec<CollectionMeta>, StoreError> {
        Ok(self.collections.lock().unwrap().values().cloned().collect())
    }
}

impl BalanceStore for MemoryStore {
    fn get_balance(&self, identity: IdentityId) -> Result<Option<IdentityBalance>, StoreError> {
        Ok(self.balances.lock().unwrap().get(&identity).cloned())
    }

    fn iter_balances(&self) -> Result<Vec<IdentityBalance>, StoreError> {
        Ok(self.balances.lock().unwrap().values().cloned().collect())
    }

    fn balance_count(&self) -> Result<u64, StoreError> {
        Ok(self.balances.lock().unwrap().len() as u64)
    }

    fn replace_balances(&self, balances: &[IdentityBalance]) -> Result<(), StoreError> {
        let mut map = self.balances.lock().unwrap();
        map.clear();
        for balance in balances {
            map.insert(balance.identity, balance.clone());
        }
        Ok(())
    }
}

impl StatsStore for MemoryStore {
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
        let tag = slot_tag(slot);
        self.grant_stats
            .lock()
            .unwrap()
            .retain(|(t, _), _| *t != tag);
        self.token_stats
            .lock()
            .unwrap()
            .retain(|(t, _, _), _| *t != tag);
        Ok(())
    }

    fn put_grant_stat(&self, slot: StatsSlot, stat: &GrantRateStat) -> Result<(), StoreError> {
        self.grant_stats
            .lock()
            .unwrap()
            .insert((slot_tag(slot), stat.grant_id), stat.clone());
        Ok(())
    }

    fn put_token_stat(&self, slot: StatsSlot, stat: &TokenRateStat) -> Result<(), StoreError> {
        self.token_stats
            .lock()
            .unwrap()
            .insert((slot_tag(slot), stat.partition.clone(), stat.token_id), stat.clone());
        Ok(())
    }

    fn iter_grant_stats(&self, slot: StatsSlot) -> Result<Vec<GrantRateStat>, StoreError> {
        let tag = slot_tag(slot);
        Ok(self
            .grant_stats
            .lock()
            .unwrap()
            .iter()
            .filter(|((t, _), _)| *t == tag)
            .map(|(_, stat)| stat.clone())
            .collect())
    }

    fn iter_token_stats(&self, slot: StatsSlot) -> Result<Vec<TokenRateStat>, StoreError> {
        let tag = slot_tag(slot);
        Ok(self
            .token_stats
            .lock()
            .unwrap()
            .iter()
            .filter(|((t, _, _), _)| *t == tag)
            .map(|(_, stat)| stat.clone())
            .collect())
    }
}

impl MetaStore for MemoryStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.metadata
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.metadata.lock().unwrap().get(key).cloned())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        self.metadata.lock().unwrap().remove(key);
        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta("schema_version")? {
            Some(bytes) if bytes.len() == 4 => {
                let arr: [u8; 4] = bytes.try_into().expect("checked length");
                Ok(u32::from_le_bytes(arr))
            }
            Some(_) => Err(StoreError::Serialization(
                "schema_version has unexpected byte length".to_string(),
            )),
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta("schema_version", &version.to_le_bytes())
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Serialization("invalid u64 byte length".to_string()))?;
    Ok(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_identities_are_sequential_and_stable() {
        let store = MemoryStore::new();
        let a = store.ensure_identity(&ConsolidationKey::new("k1")).unwrap();
        let b = store.ensure_identity(&ConsolidationKey::new("k2")).unwrap();
        let again = store.ensure_identity(&ConsolidationKey::new("k1")).unwrap();
        assert_eq!(a, IdentityId::new(1));
        assert_eq!(b, IdentityId::new(2));
        assert_eq!(again, a);
        assert_eq!(store.identity_count().unwrap(), 2);
    }

    #[test]
    fn replace_balances_is_wipe_then_write() {
        let store = MemoryStore::new();
        store
            .replace_balances(&[IdentityBalance {
                identity: IdentityId::new(1),
                produced: 1.0,
                granted_out: 0.0,
                x_tdh: 1.0,
            }])
            .unwrap();
        store
            .replace_balances(&[IdentityBalance {
                identity: IdentityId::new(2),
                produced: 2.0,
                granted_out: 0.0,
                x_tdh: 2.0,
            }])
            .unwrap();
        assert!(store.get_balance(IdentityId::new(1)).unwrap().is_none());
        assert_eq!(store.balance_count().unwrap(), 1);
    }

    #[test]
    fn active_slot_defaults_to_a() {
        let store = MemoryStore::new();
        assert_eq!(store.active_slot().unwrap(), StatsSlot::A);
        store.activate_slot(StatsSlot::B).unwrap();
        assert_eq!(store.active_slot().unwrap(), StatsSlot::B);
    }

    #[test]
    fn events_iterate_in_token_then_time_order() {
        let store = MemoryStore::new();
        let partition = Partition::new("0xc0ffee");
        for (token, day, block) in [(2u64, 5u64, 2u64), (1, 9, 3), (1, 1, 1)] {
            store
                .put_event(&OwnershipEvent {
                    partition: partition.clone(),
                    token_id: TokenId::new(token),
                    owner: WalletAddress::new("0xa1"),
                    since_time: xtdh_types::Timestamp::from_days(day),
                    since_block: block,
                    log_index: 0,
                    acquired_as_sale: false,
                })
                .unwrap();
        }
        let events = store.iter_events().unwrap();
        let order: Vec<(u64, u64)> = events
            .iter()
            .map(|e| (e.token_id.as_u64(), e.since_time.day()))
            .collect();
        assert_eq!(order, vec![(1, 1), (1, 9), (2, 5)]);
    }
}
