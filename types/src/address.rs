//! Wallet address and consolidation key types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An on-chain wallet address, always prefixed with `0x`.
///
/// Stored lowercase so that addresses compare and hash consistently
/// regardless of how the upstream indexer checksummed them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// The standard hex prefix for all wallet addresses.
    pub const PREFIX: &'static str = "0x";

    /// Create a new wallet address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `0x`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into().to_lowercase();
        assert!(s.starts_with(Self::PREFIX), "address must start with 0x");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A durable key grouping every wallet controlled by one real-world identity.
///
/// Produced by the external consolidation resolver. A wallet with no
/// consolidation entry is treated as a consolidation of one, keyed by its
/// own address — see [`ConsolidationKey::from_wallet`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsolidationKey(String);

impl ConsolidationKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The singleton consolidation for a wallet the resolver does not know.
    pub fn from_wallet(wallet: &WalletAddress) -> Self {
        Self(wallet.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsolidationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
