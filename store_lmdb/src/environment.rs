//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::write_batch::WriteBatch;
use crate::LmdbError;
use xtdh_store::{MetaStore, StatsSlot, StoreError};

/// Schema version written into a freshly created environment.
pub const SCHEMA_VERSION: u32 = 1;

const MAX_DBS: u32 = 16;

/// The LMDB-backed store: one environment, one named database per logical
/// store, two parallel database pairs for the stats slots.
pub struct LmdbStore {
    env: Arc<Env>,
    pub(crate) grants_db: Database<Bytes, Bytes>,
    pub(crate) grant_tokens_db: Database<Bytes, Bytes>,
    pub(crate) events_db: Database<Bytes, Bytes>,
    pub(crate) consolidation_db: Database<Bytes, Bytes>,
    pub(crate) identities_db: Database<Bytes, Bytes>,
    pub(crate) collections_db: Database<Bytes, Bytes>,
    pub(crate) balances_db: Database<Bytes, Bytes>,
    pub(crate) grant_stats_a_db: Database<Bytes, Bytes>,
    pub(crate) grant_stats_b_db: Database<Bytes, Bytes>,
    pub(crate) token_stats_a_db: Database<Bytes, Bytes>,
    pub(crate) token_stats_b_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates every expected database, then checks the schema version: a
    /// fresh environment is stamped with [`SCHEMA_VERSION`], a mismatched
    /// one is refused.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // Safety: the environment directory is owned by this process; no
        // other environment is opened on the same path in-process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)
                .map_err(LmdbError::from)?
        };
        let env = Arc::new(env);

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let grants_db = env
            .create_database(&mut wtxn, Some("grants"))
            .map_err(LmdbError::from)?;
        let grant_tokens_db = env
            .create_database(&mut wtxn, Some("grant_tokens"))
            .map_err(LmdbError::from)?;
        let events_db = env
            .create_database(&mut wtxn, Some("ownership_events"))
            .map_err(LmdbError::from)?;
        let consolidation_db = env
            .create_database(&mut wtxn, Some("consolidation"))
            .map_err(LmdbError::from)?;
        let identities_db = env
            .create_database(&mut wtxn, Some("identities"))
            .map_err(LmdbError::from)?;
        let collections_db = env
            .create_database(&mut wtxn, Some("collections"))
            .map_err(LmdbError::from)?;
        let balances_db = env
            .create_database(&mut wtxn, Some("balances"))
            .map_err(LmdbError::from)?;
        let grant_stats_a_db = env
            .create_database(&mut wtxn, Some("grant_stats_a"))
            .map_err(LmdbError::from)?;
        let grant_stats_b_db = env
            .create_database(&mut wtxn, Some("grant_stats_b"))
            .map_err(LmdbError::from)?;
        let token_stats_a_db = env
            .create_database(&mut wtxn, Some("token_stats_a"))
            .map_err(LmdbError::from)?;
        let token_stats_b_db = env
            .create_database(&mut wtxn, Some("token_stats_b"))
            .map_err(LmdbError::from)?;
        let meta_db = env
            .create_database(&mut wtxn, Some("meta"))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        let store = Self {
            env,
            grants_db,
            grant_tokens_db,
            events_db,
            consolidation_db,
            identities_db,
            collections_db,
            balances_db,
            grant_stats_a_db,
            grant_stats_b_db,
            token_stats_a_db,
            token_stats_b_db,
            meta_db,
        };

        match store.get_schema_version()? {
            0 => {
                store.set_schema_version(SCHEMA_VERSION)?;
                info!(path = %path.display(), version = SCHEMA_VERSION, "created xTDH store");
            }
            SCHEMA_VERSION => {}
            other => {
                return Err(StoreError::Corruption(format!(
                    "unsupported schema version {} (expected {})",
                    other, SCHEMA_VERSION
                )));
            }
        }

        Ok(store)
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn grant_stats_db(&self, slot: StatsSlot) -> Database<Bytes, Bytes> {
        match slot {
            StatsSlot::A => self.grant_stats_a_db,
            StatsSlot::B => self.grant_stats_b_db,
        }
    }

    pub(crate) fn token_stats_db(&self, slot: StatsSlot) -> Database<Bytes, Bytes> {
        match slot {
            StatsSlot::A => self.token_stats_a_db,
            StatsSlot::B => self.token_stats_b_db,
        }
    }

    /// Begin a write batch grouping multiple store operations into one
    /// LMDB write transaction.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }
}
