//! LMDB implementation of IdentityStore.

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{meta, IdentityStore, StoreError};
use xtdh_types::{ConsolidationKey, IdentityId};

impl IdentityStore for LmdbStore {
    fn get_identity(&self, key: &ConsolidationKey) -> Result<Option<IdentityId>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .identities_db
            .get(&rtxn, key.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) if bytes.len() == 8 => {
                let arr: [u8; 8] = bytes.try_into().expect("checked length");
                Ok(Some(IdentityId::new(u64::from_be_bytes(arr))))
            }
            Some(_) => Err(StoreError::Corruption(
                "identity id has unexpected byte length".to_string(),
            )),
            None => Ok(None),
        }
    }

    fn ensure_identity(&self, key: &ConsolidationKey) -> Result<IdentityId, StoreError> {
        // Mint inside one write transaction so the counter bump and the
        // registry entry land together.
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        if let Some(bytes) = self
            .identities_db
            .get(&wtxn, key.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                StoreError::Corruption("identity id has unexpected byte length".to_string())
            })?;
            return Ok(IdentityId::new(u64::from_be_bytes(arr)));
        }

        let next = match self
            .meta_db
            .get(&wtxn, meta::NEXT_IDENTITY_KEY.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption("identity counter has unexpected byte length".to_string())
                })?;
                u64::from_be_bytes(arr)
            }
            None => 1,
        };

        self.identities_db
            .put(&mut wtxn, key.as_str().as_bytes(), &next.to_be_bytes())
            .map_err(LmdbError::from)?;
        self.meta_db
            .put(
                &mut wtxn,
                meta::NEXT_IDENTITY_KEY.as_bytes(),
                &(next + 1).to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(IdentityId::new(next))
    }

    fn iter_identities(&self) -> Result<Vec<(ConsolidationKey, IdentityId)>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self.identities_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut identities = Vec::new();
        for entry in iter {
            let (key, bytes) = entry.map_err(LmdbError::from)?;
            let key = std::str::from_utf8(key)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                StoreError::Corruption("identity id has unexpected byte length".to_string())
            })?;
            identities.push((ConsolidationKey::new(key), IdentityId::new(u64::from_be_bytes(arr))));
        }
        Ok(identities)
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.identities_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minting_is_sequential_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).unwrap();
        let a = store.ensure_identity(&ConsolidationKey::new("k1")).unwrap();
        let b = store.ensure_identity(&ConsolidationKey::new("k2")).unwrap();
        let again = store.ensure_identity(&ConsolidationKey::new("k1")).unwrap();
        assert_eq!(a, IdentityId::new(1));
        assert_eq!(b, IdentityId::new(2));
        assert_eq!(again, a);
        assert_eq!(store.identity_count().unwrap(), 2);
        assert_eq!(
            store.get_identity(&ConsolidationKey::new("k2")).unwrap(),
            Some(b)
        );
    }
}
