//! Pre-built [`tracing::Span`] constructors for the recalculation pipeline.
//!
//! Using consistent span names and field sets across the codebase makes it
//! easy to filter, search, and correlate traces in any OpenTelemetry-
//! compatible backend.

use tracing::{info_span, Span};

/// Span covering one full recalculation run at the given cutoff.
pub fn recalc_run_span(cutoff_day: u64) -> Span {
    info_span!("recalc_run", cutoff_day = %cutoff_day)
}

/// Span covering the allocation pass over all eligible grants.
pub fn allocation_span(grant_count: usize) -> Span {
    info_span!("allocation", grants = %grant_count)
}

/// Span covering the transactional balance write sequence.
pub fn balance_write_span(identity_count: usize) -> Span {
    info_span!("balance_write", identities = %identity_count)
}

/// Span covering a stats rebuild into one slot.
pub fn stats_rebuild_span(slot: &str) -> Span {
    info_span!("stats_rebuild", slot = %slot)
}

/// Span covering the promotion of a freshly rebuilt slot.
pub fn slot_activate_span(slot: &str) -> Span {
    info_span!("slot_activate", slot = %slot)
}
