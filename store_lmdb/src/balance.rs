//! LMDB implementation of BalanceStore.
//!
//! The full-overwrite contract runs through [`WriteBatch`]: the wipe and
//! every row write share one LMDB write transaction, so a crash mid-way
//! leaves the previous committed balance set fully intact.

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{BalanceStore, IdentityBalance, StoreError};
use xtdh_types::IdentityId;

impl BalanceStore for LmdbStore {
    fn get_balance(&self, identity: IdentityId) -> Result<Option<IdentityBalance>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .balances_db
            .get(&rtxn, &identity.as_u64().to_be_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn iter_balances(&self) -> Result<Vec<IdentityBalance>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self.balances_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut balances = Vec::new();
        for entry in iter {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            balances.push(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            );
        }
        Ok(balances)
    }

    fn balance_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.balances_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn replace_balances(&self, balances: &[IdentityBalance]) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.wipe_balances()?;
        for balance in balances {
            batch.put_balance(balance)?;
        }
        batch.commit()
    }
}
