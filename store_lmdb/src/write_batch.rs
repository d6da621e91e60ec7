//! Write batching — groups multiple store operations into a single LMDB
//! write transaction.
//!
//! The balance recompute commits through a batch: wipe, then every new
//! row, then the run bookkeeping, all atomically. If the batch is dropped
//! without calling [`WriteBatch::commit`], all operations are rolled back
//! (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{IdentityBalance, StoreError};

/// A write batch over the xTDH store.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    store: &'a LmdbStore,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(store: &'a LmdbStore) -> Result<Self, StoreError> {
        let txn = store.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, store })
    }

    /// Delete every balance row.
    pub fn wipe_balances(&mut self) -> Result<(), StoreError> {
        self.store
            .balances_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Write one balance row.
    pub fn put_balance(&mut self, balance: &IdentityBalance) -> Result<(), StoreError> {
        let bytes = bincode::serialize(balance)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store
            .balances_db
            .put(
                &mut self.txn,
                &balance.identity.as_u64().to_be_bytes(),
                &bytes,
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Write one metadata value.
    pub fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.store
            .meta_db
            .put(&mut self.txn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Commit every batched operation atomically.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
