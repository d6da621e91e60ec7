//! LMDB implementation of CollectionStore.

use crate::environment::LmdbStore;
use crate::LmdbError;
use xtdh_store::{CollectionMeta, CollectionStore, StoreError};
use xtdh_types::Partition;

impl CollectionStore for LmdbStore {
    fn put_collection(&self, meta: &CollectionMeta) -> Result<(), StoreError> {
        let bytes = bincode::serialize(meta)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.collections_db
            .put(&mut wtxn, meta.partition.as_str().as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_collection(&self, partition: &Partition) -> Result<Option<CollectionMeta>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .collections_db
            .get(&rtxn, partition.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn iter_collections(&self) -> Result<Vec<CollectionMeta>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self.collections_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut collections = Vec::new();
        for entry in iter {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            collections.push(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            );
        }
        Ok(collections)
    }
}
