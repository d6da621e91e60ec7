//! The rate re-review hook.
//!
//! An external step, opaque to this engine, that may adjust grant rates
//! immediately before a recomputation. It runs first so the snapshot the
//! allocation engine reads already reflects its adjustments.

use thiserror::Error;
use xtdh_types::Timestamp;

/// Failure of the external rate re-review step. Aborts the run; the next
/// scheduled run retries wholesale.
#[derive(Debug, Error)]
#[error("rate re-review failed: {0}")]
pub struct ReviewError(pub String);

/// The external rate re-review step.
pub trait RateReviewer: Send + Sync {
    /// Adjust grant rates ahead of the recomputation at `cutoff`. Whatever
    /// it writes to the grant store is read back as part of this run's
    /// snapshot.
    fn review(&self, cutoff: Timestamp) -> Result<(), ReviewError>;
}

/// A reviewer that adjusts nothing. Used when no re-review step is
/// deployed.
pub struct NoopRateReviewer;

impl RateReviewer for NoopRateReviewer {
    fn review(&self, _cutoff: Timestamp) -> Result<(), ReviewError> {
        Ok(())
    }
}
