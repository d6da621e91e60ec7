//! Identity identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A minted identity id.
///
/// One identity corresponds to one consolidation key. Ids are sequential
/// and minted by the recalculation orchestrator for any consolidation key
/// observed in the ownership history that does not yet have one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityId(u64);

impl IdentityId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identity-{}", self.0)
    }
}
