//! Allocation engine errors.

use thiserror::Error;
use xtdh_types::ConsolidationKey;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A token holder's consolidation key has no registered identity.
    ///
    /// The orchestrator mints identities for every observed wallet before
    /// allocation runs, so hitting this means the snapshot was assembled
    /// without that step.
    #[error("no identity registered for consolidation key {0}")]
    MissingIdentity(ConsolidationKey),
}
