//! Consolidation mapping storage trait.

use crate::StoreError;
use xtdh_types::{ConsolidationKey, WalletAddress};

/// Trait for the wallet → consolidation-key mapping.
///
/// Maintained by the external consolidation resolver; read-only to this
/// engine. A wallet without an entry is treated as a consolidation of one
/// (its own address is its key).
pub trait ConsolidationStore {
    /// Record a wallet's consolidation key.
    fn put_mapping(&self, wallet: &WalletAddress, key: &ConsolidationKey) -> Result<(), StoreError>;

    /// Look up a wallet's consolidation key.
    fn get_key(&self, wallet: &WalletAddress) -> Result<Option<ConsolidationKey>, StoreError>;

    /// Every recorded mapping, ordered by wallet.
    fn iter_mappings(&self) -> Result<Vec<(WalletAddress, ConsolidationKey)>, StoreError>;

    /// The effective key for a wallet: the mapped key, or the wallet's own
    /// singleton key when the resolver has no entry for it.
    fn effective_key(&self, wallet: &WalletAddress) -> Result<ConsolidationKey, StoreError> {
        Ok(self
            .get_key(wallet)?
            .unwrap_or_else(|| ConsolidationKey::from_wallet(wallet)))
    }
}
