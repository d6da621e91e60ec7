//! Double-buffered stats rebuild and promotion.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::StatsError;
use crate::metrics::EngineMetrics;
use xtdh_engine::{Allocator, RateSnapshot, Snapshot};
use xtdh_store::{
    CollectionStore, ConsolidationStore, GrantStore, IdentityStore, OwnershipStore, StatsSlot,
    StatsStore,
};
use xtdh_types::Timestamp;
use xtdh_utils::spans::{slot_activate_span, stats_rebuild_span};

/// Rebuilds the inactive stats slot and promotes it.
///
/// Runs outside the balance-recompute transaction, usually in a detached
/// worker triggered after a committed run. Concurrent readers are safe by
/// construction: they resolve the active slot first, and the materializer
/// only ever writes into the other one.
pub struct StatsMaterializer<S> {
    store: Arc<S>,
    metrics: Arc<EngineMetrics>,
}

impl<S> StatsMaterializer<S>
where
    S: StatsStore + GrantStore + OwnershipStore + ConsolidationStore + IdentityStore + CollectionStore,
{
    pub fn new(store: Arc<S>, metrics: Arc<EngineMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Rebuild both stat kinds into the inactive slot, then activate it.
    ///
    /// Returns the freshly computed global granted-rate total. On any
    /// rebuild failure the marker is left untouched and the previously
    /// active slot keeps serving; the caller logs and moves on.
    pub fn rebuild_and_activate(&self, cutoff: Timestamp) -> Result<f64, StatsError> {
        let active = self.store.active_slot()?;
        let target = active.other();
        let span = stats_rebuild_span(target.as_str());
        let _guard = span.enter();

        let snapshot = Snapshot::load(&*self.store, cutoff)?;
        let allocator = Allocator::new(&snapshot);
        let rates = allocator.rate_snapshot();

        self.store.clear_slot(target)?;
        self.rebuild_grant_stats(target, &rates)?;
        self.rebuild_token_stats(target, &rates)?;
        let total = self.global_granted_total(target)?;

        {
            let span = slot_activate_span(target.as_str());
            let _guard = span.enter();
            self.store.activate_slot(target)?;
        }

        self.metrics.granted_rate_total.set(total);
        info!(
            slot = target.as_str(),
            granted_total = total,
            grants = rates.grant_rates.len(),
            tokens = rates.token_rates.len(),
            "stats slot activated"
        );
        Ok(total)
    }

    /// Write the per-grant daily-rate rows into `target`.
    pub fn rebuild_grant_stats(&self, target: StatsSlot, rates: &RateSnapshot) -> Result<(), StatsError> {
        for stat in &rates.grant_rates {
            self.store.put_grant_stat(target, stat)?;
        }
        Ok(())
    }

    /// Write the per-token daily-rate rows into `target`.
    pub fn rebuild_token_stats(&self, target: StatsSlot, rates: &RateSnapshot) -> Result<(), StatsError> {
        for stat in &rates.token_rates {
            self.store.put_token_stat(target, stat)?;
        }
        Ok(())
    }

    /// Sum the per-grant rates already written to `target`.
    pub fn global_granted_total(&self, target: StatsSlot) -> Result<f64, StatsError> {
        Ok(self
            .store
            .iter_grant_stats(target)?
            .iter()
            .map(|g| g.daily_rate)
            .sum())
    }

    /// Best-effort wrapper for worker loops: logs instead of propagating.
    pub fn try_rebuild(&self, cutoff: Timestamp) {
        if let Err(e) = self.rebuild_and_activate(cutoff) {
            warn!(error = %e, "stats rebuild failed, previous slot keeps serving");
        }
    }
}
