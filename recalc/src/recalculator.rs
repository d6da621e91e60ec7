//! The full-universe recompute sequence.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::RecalcError;
use crate::review::RateReviewer;
use crate::trigger::{StatsRebuildRequest, StatsTrigger};
use xtdh_engine::{Allocator, Snapshot};
use xtdh_store::{
    meta, BalanceStore, CollectionStore, ConsolidationStore, GrantStore, IdentityStore, MetaStore,
    OwnershipStore,
};
use xtdh_types::Timestamp;
use xtdh_utils::spans::{allocation_span, balance_write_span, recalc_run_span};
use xtdh_utils::PhaseTimer;

/// Outcome of one committed recalculation run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// The cutoff the run computed at.
    pub cutoff: Timestamp,
    /// Number of identity balance rows written.
    pub identity_count: usize,
    /// Identities minted for wallets the consolidation mapping did not
    /// know.
    pub minted: usize,
    /// Wall-clock duration of the whole run.
    pub duration: Duration,
}

/// Sequences one all-or-nothing recompute.
///
/// The balance write is a single atomic replace: either the whole new set
/// lands or the previous committed state stays intact. Exclusivity across
/// runs comes from the trigger mechanism (the scheduler runs at most one
/// instance); there is no application-level lock to relax that with.
pub struct Recalculator<S> {
    store: Arc<S>,
    reviewer: Box<dyn RateReviewer>,
    trigger: StatsTrigger,
}

impl<S> Recalculator<S>
where
    S: GrantStore
        + OwnershipStore
        + ConsolidationStore
        + IdentityStore
        + CollectionStore
        + BalanceStore
        + MetaStore,
{
    pub fn new(store: Arc<S>, reviewer: Box<dyn RateReviewer>, trigger: StatsTrigger) -> Self {
        Self {
            store,
            reviewer,
            trigger,
        }
    }

    /// Run a full recompute as of the most recent UTC day boundary before
    /// `now`.
    ///
    /// Any input failure aborts the run with nothing written; the next
    /// scheduled run retries wholesale. The stats trigger fires only after
    /// the balance write has landed.
    pub fn run(&self, now: Timestamp) -> Result<RunSummary, RecalcError> {
        let cutoff = now.day_floor();
        let span = recalc_run_span(cutoff.day());
        let _guard = span.enter();
        let mut timer = PhaseTimer::new();

        timer.time("rate_review", || self.reviewer.review(cutoff))?;
        let minted = timer.time("ensure_identities", || self.ensure_identities())?;
        let snapshot = timer.time("load_snapshot", || Snapshot::load(&*self.store, cutoff))?;
        let result = timer.time("allocate", || {
            let span = allocation_span(snapshot.grants.len());
            let _guard = span.enter();
            Allocator::new(&snapshot).compute()
        })?;
        timer.time("write_balances", || {
            let span = balance_write_span(result.balances.len());
            let _guard = span.enter();
            self.store.replace_balances(&result.balances)
        })?;

        self.store
            .put_meta(meta::LAST_RUN_CUTOFF_KEY, &cutoff.as_secs().to_be_bytes())?;
        self.store.put_meta(
            meta::LAST_RUN_DURATION_KEY,
            &(timer.total().as_millis() as u64).to_be_bytes(),
        )?;

        // Balances are committed; the stats rebuild is someone else's
        // problem from here on.
        self.trigger.send(StatsRebuildRequest { cutoff });

        timer.report();
        info!(
            cutoff_day = cutoff.day(),
            identities = result.balances.len(),
            minted,
            "recalculation committed"
        );

        Ok(RunSummary {
            cutoff,
            identity_count: result.balances.len(),
            minted,
            duration: timer.total(),
        })
    }

    /// Mint an identity for every observed wallet whose effective
    /// consolidation key has none yet, so no ownership event is silently
    /// excluded from the allocation.
    fn ensure_identities(&self) -> Result<usize, RecalcError> {
        let mut minted = 0;
        for wallet in self.store.observed_wallets()? {
            let key = self.store.effective_key(&wallet)?;
            if self.store.get_identity(&key)?.is_none() {
                let identity = self.store.ensure_identity(&key)?;
                debug!(%wallet, %identity, "minted identity for unmapped wallet");
                minted += 1;
            }
        }
        Ok(minted)
    }
}
