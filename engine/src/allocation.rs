//! The per-grant allocation passes and balance assembly.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::snapshot::Snapshot;
use crate::timeline::{build_timelines, TokenTimeline};
use xtdh_store::{Grant, IdentityBalance, TokenMode};
use xtdh_types::{IdentityId, Partition, TokenId, Timestamp};

/// Fully-elapsed intervening days between `start` and `end`.
///
/// The boundary day of acquisition and the cutoff day itself are both
/// excluded: `max(0, day(end) − day(start) − 1)`. This is the source
/// system's literal counting policy, reproduced exactly.
pub fn full_days(start: Timestamp, end: Timestamp) -> u64 {
    (end.day() as i64 - start.day() as i64 - 1).max(0) as u64
}

/// The output of one allocation run.
///
/// The tally maps are exposed for tests and inspection; `balances` is the
/// final row set the orchestrator persists, one row per registered
/// identity, sorted by identity id.
#[derive(Clone, Debug, Default)]
pub struct AllocationResult {
    pub granted_out: BTreeMap<IdentityId, f64>,
    pub received: BTreeMap<IdentityId, f64>,
    pub produced: BTreeMap<IdentityId, f64>,
    pub balances: Vec<IdentityBalance>,
}

/// Computes identity balances over one [`Snapshot`].
///
/// Construction builds the per-token timelines and the per-partition
/// observed-token index once; both the allocation passes and the stats
/// rate snapshot reuse them.
pub struct Allocator<'a> {
    snapshot: &'a Snapshot,
    timelines: BTreeMap<(Partition, TokenId), TokenTimeline>,
    observed: BTreeMap<Partition, Vec<TokenId>>,
}

impl<'a> Allocator<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        let timelines = build_timelines(&snapshot.events);
        let mut observed: BTreeMap<Partition, Vec<TokenId>> = BTreeMap::new();
        for (partition, token_id) in timelines.keys() {
            observed.entry(partition.clone()).or_default().push(*token_id);
        }
        Self {
            snapshot,
            timelines,
            observed,
        }
    }

    pub(crate) fn snapshot(&self) -> &Snapshot {
        self.snapshot
    }

    pub(crate) fn timeline(&self, partition: &Partition, token: TokenId) -> Option<&TokenTimeline> {
        self.timelines.get(&(partition.clone(), token))
    }

    /// The denominator a grant's rate is split over: total supply for
    /// `All`-mode grants, enumerated-set size for `Include`-mode.
    pub(crate) fn denominator(&self, grant: &Grant) -> u64 {
        match grant.token_mode {
            TokenMode::All => self.snapshot.total_supply(&grant.partition),
            TokenMode::Include => self.snapshot.tokens_of(grant.id).len() as u64,
        }
    }

    /// The token universe a grant allocates over: every token ever
    /// observed in the partition for `All`-mode, exactly the enumerated
    /// set for `Include`-mode.
    pub(crate) fn universe(&self, grant: &Grant) -> &[TokenId] {
        match grant.token_mode {
            TokenMode::All => self
                .observed
                .get(&grant.partition)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            TokenMode::Include => self.snapshot.tokens_of(grant.id),
        }
    }

    /// Run the full allocation: per-grant contribution passes, the
    /// produced pass, and the self-retained remainder, in that order.
    pub fn compute(&self) -> Result<AllocationResult, EngineError> {
        let cutoff = self.snapshot.cutoff;
        let mut granted_out: BTreeMap<IdentityId, f64> = BTreeMap::new();
        let mut received: BTreeMap<IdentityId, f64> = BTreeMap::new();

        for grant in &self.snapshot.grants {
            if !grant.participates_at(cutoff) {
                continue;
            }
            let denominator = self.denominator(grant);
            if denominator == 0 {
                // Zero allocation, not an error.
                continue;
            }
            let per_token = grant.daily_rate / denominator as f64;
            let window_end = grant.window_end(cutoff);

            for &token_id in self.universe(grant) {
                let Some(timeline) = self.timeline(&grant.partition, token_id) else {
                    continue;
                };
                let Some(window) = timeline.counted_window_at(cutoff, self.snapshot) else {
                    continue;
                };
                let window_start = window.start.max(grant.valid_from);
                let days = full_days(window_start, window_end);
                if days == 0 {
                    continue;
                }
                let contribution = per_token * days as f64;
                let holder = self
                    .snapshot
                    .identity_of(&window.current.owner)
                    .ok_or_else(|| {
                        EngineError::MissingIdentity(
                            self.snapshot.effective_key(&window.current.owner),
                        )
                    })?;
                *granted_out.entry(grant.grantor).or_default() += contribution;
                *received.entry(holder).or_default() += contribution;
            }
        }

        let produced = self.produced_tallies()?;

        // One row per registered identity. The received sum lands first;
        // the self-retained remainder (produced − granted_out) is added on
        // top of it, matching the fixed write order.
        let mut balances: BTreeMap<IdentityId, IdentityBalance> = BTreeMap::new();
        for &identity in self.snapshot.identities.values() {
            let produced_tally = produced.get(&identity).copied().unwrap_or(0.0);
            let granted_out_tally = granted_out.get(&identity).copied().unwrap_or(0.0);
            let mut x_tdh = received.get(&identity).copied().unwrap_or(0.0);
            x_tdh += produced_tally - granted_out_tally;
            balances.insert(
                identity,
                IdentityBalance {
                    identity,
                    produced: produced_tally,
                    granted_out: granted_out_tally,
                    x_tdh,
                },
            );
        }

        Ok(AllocationResult {
            granted_out,
            received,
            produced,
            balances: balances.into_values().collect(),
        })
    }

    /// The grant-independent produced pass: each currently held token
    /// yields its collection's base daily rate for every counted day of
    /// the holder's reset-bounded window.
    fn produced_tallies(&self) -> Result<BTreeMap<IdentityId, f64>, EngineError> {
        let cutoff = self.snapshot.cutoff;
        let mut produced: BTreeMap<IdentityId, f64> = BTreeMap::new();

        for timeline in self.timelines.values() {
            let Some(collection) = self.snapshot.collections.get(&timeline.partition) else {
                continue;
            };
            if collection.base_daily_rate == 0.0 {
                continue;
            }
            let Some(window) = timeline.counted_window_at(cutoff, self.snapshot) else {
                continue;
            };
            let days = full_days(window.start, cutoff);
            if days == 0 {
                continue;
            }
            let holder = self
                .snapshot
                .identity_of(&window.current.owner)
                .ok_or_else(|| {
                    EngineError::MissingIdentity(self.snapshot.effective_key(&window.current.owner))
                })?;
            *produced.entry(holder).or_default() += collection.base_daily_rate * days as f64;
        }

        Ok(produced)
    }
}
