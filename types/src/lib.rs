//! Fundamental types for the xTDH distribution engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: wallet addresses, consolidation keys, identity/grant/token
//! identifiers, partitions, and timestamps with UTC day arithmetic.

pub mod address;
pub mod identity;
pub mod scope;
pub mod time;

pub use address::{ConsolidationKey, WalletAddress};
pub use identity::IdentityId;
pub use scope::{GrantId, Partition, TokenId};
pub use time::{Timestamp, SECS_PER_DAY};
