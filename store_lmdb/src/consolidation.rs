//! LMDB implementation of ConsolidationStore.

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{ConsolidationStore, StoreError};
use xtdh_types::{ConsolidationKey, WalletAddress};

impl ConsolidationStore for LmdbStore {
    fn put_mapping(&self, wallet: &WalletAddress, key: &ConsolidationKey) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.consolidation_db
            .put(&mut wtxn, wallet.as_str().as_bytes(), key.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_key(&self, wallet: &WalletAddress) -> Result<Option<ConsolidationKey>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .consolidation_db
            .get(&rtxn, wallet.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let key = std::str::from_utf8(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(ConsolidationKey::new(key)))
            }
            None => Ok(None),
        }
    }

    fn iter_mappings(&self) -> Result<Vec<(WalletAddress, ConsolidationKey)>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self.consolidation_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut mappings = Vec::new();
        for entry in iter {
            let (wallet, key) = entry.map_err(LmdbError::from)?;
            let wallet = std::str::from_utf8(wallet)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let key = std::str::from_utf8(key)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            mappings.push((WalletAddress::new(wallet), ConsolidationKey::new(key)));
        }
        Ok(mappings)
    }
}
