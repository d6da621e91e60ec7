//! Identity balance rows and storage trait.

use serde::{Deserialize, Serialize};

use crate::StoreError;
use xtdh_types::IdentityId;

/// The computed balance of one identity as of the last committed
/// recomputation.
///
/// Mutated only by a full recomputation; never incrementally patched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityBalance {
    pub identity: IdentityId,
    /// Total rate the identity generates from tokens its consolidated
    /// wallets currently hold, independent of grants.
    pub produced: f64,
    /// Sum of rate the identity has redirected to others via active grants.
    pub granted_out: f64,
    /// Resulting held balance: grants received from others, plus the
    /// identity's own produced rate minus whatever it granted away.
    pub x_tdh: f64,
}

/// Trait for persisted identity balances.
///
/// Reads see only fully committed recomputations: the entire balance set is
/// replaced in one atomic operation, never row by row.
pub trait BalanceStore {
    fn get_balance(&self, identity: IdentityId) -> Result<Option<IdentityBalance>, StoreError>;

    /// Every balance row, ordered by identity.
    fn iter_balances(&self) -> Result<Vec<IdentityBalance>, StoreError>;

    fn balance_count(&self) -> Result<u64, StoreError>;

    /// Atomically wipe the previous balance set and write the new one.
    ///
    /// Either every row lands or none do; a reader concurrent with this
    /// call observes the old set or the new set, never a mixture.
    fn replace_balances(&self, balances: &[IdentityBalance]) -> Result<(), StoreError>;
}
