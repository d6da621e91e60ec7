//! Identity registry storage trait.

use crate::StoreError;
use xtdh_types::{ConsolidationKey, IdentityId};

/// Trait for the consolidation-key → identity registry.
///
/// Identities are minted sequentially; the next-id counter is persisted so
/// ids are stable across restarts.
pub trait IdentityStore {
    /// Look up the identity for a consolidation key.
    fn get_identity(&self, key: &ConsolidationKey) -> Result<Option<IdentityId>, StoreError>;

    /// Get the identity for a consolidation key, minting a new one if the
    /// key has none yet.
    fn ensure_identity(&self, key: &ConsolidationKey) -> Result<IdentityId, StoreError>;

    /// Every registered `(key, identity)` pair, ordered by key.
    fn iter_identities(&self) -> Result<Vec<(ConsolidationKey, IdentityId)>, StoreError>;

    /// Number of registered identities.
    fn identity_count(&self) -> Result<u64, StoreError>;
}
