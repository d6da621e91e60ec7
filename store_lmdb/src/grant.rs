//! LMDB implementation of GrantStore.

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{Grant, GrantStore, GrantTokenRow, StoreError};
use xtdh_types::{GrantId, TokenId};

/// Composite key for one enumerated token: grant id ++ token id, both
/// big-endian so the prefix scan returns tokens in id order.
fn grant_token_key(grant_id: GrantId, token_id: TokenId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&grant_id.as_u64().to_be_bytes());
    key[8..].copy_from_slice(&token_id.as_u64().to_be_bytes());
    key
}

impl GrantStore for LmdbStore {
    fn put_grant(&self, grant: &Grant) -> Result<(), StoreError> {
        let bytes = bincode::serialize(grant)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.grants_db
            .put(&mut wtxn, &grant.id.as_u64().to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_grant(&self, id: GrantId) -> Result<Option<Grant>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .grants_db
            .get(&rtxn, &id.as_u64().to_be_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn iter_grants(&self) -> Result<Vec<Grant>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self.grants_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut grants = Vec::new();
        for entry in iter {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            grants.push(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            );
        }
        Ok(grants)
    }

    fn put_grant_token(&self, row: &GrantTokenRow) -> Result<(), StoreError> {
        let key = grant_token_key(row.grant_id, row.token_id);
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.grant_tokens_db
            .put(&mut wtxn, &key, &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn grant_tokens(&self, id: GrantId) -> Result<Vec<TokenId>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let prefix = id.as_u64().to_be_bytes();
        let iter = self
            .grant_tokens_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut tokens = Vec::new();
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            if key.len() != 16 {
                return Err(StoreError::Corruption(
                    "grant token key has unexpected length".to_string(),
                ));
            }
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&key[8..]);
            tokens.push(TokenId::new(u64::from_be_bytes(buf)));
        }
        Ok(tokens)
    }
}
