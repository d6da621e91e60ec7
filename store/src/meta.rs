//! Metadata storage trait and well-known keys.

use crate::StoreError;

/// Meta key holding the active stats slot marker (`"a"` or `"b"`).
pub const ACTIVE_SLOT_KEY: &str = "active_stats_slot";

/// Meta key holding the next identity id to mint (big-endian u64).
pub const NEXT_IDENTITY_KEY: &str = "next_identity_id";

/// Meta key holding the cutoff of the last committed run (big-endian u64
/// seconds).
pub const LAST_RUN_CUTOFF_KEY: &str = "last_run_cutoff";

/// Meta key holding the wall-clock duration of the last committed run
/// (big-endian u64 milliseconds).
pub const LAST_RUN_DURATION_KEY: &str = "last_run_duration_ms";

/// Trait for small metadata values (slot marker, counters, run bookkeeping,
/// schema version).
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn delete_meta(&self, key: &str) -> Result<(), StoreError>;

    /// Current schema version; 0 for a freshly created store.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
