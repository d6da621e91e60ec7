//! Daily-rate snapshots at the cutoff, consumed by the stats materializer.

use std::collections::BTreeMap;

use crate::allocation::Allocator;
use xtdh_store::{GrantRateStat, TokenRateStat};
use xtdh_types::{Partition, TokenId};

/// Per-grant and per-token daily rates as of one cutoff.
#[derive(Clone, Debug, Default)]
pub struct RateSnapshot {
    /// One row per eligible grant, ordered by grant id. Expired or
    /// zero-denominator grants appear with a rate of 0.
    pub grant_rates: Vec<GrantRateStat>,
    /// One row per token currently redirecting rate, ordered by
    /// `(partition, token)`.
    pub token_rates: Vec<TokenRateStat>,
}

impl RateSnapshot {
    /// The global granted daily-rate total: the sum of every per-grant
    /// effective rate.
    pub fn global_granted_total(&self) -> f64 {
        self.grant_rates.iter().map(|g| g.daily_rate).sum()
    }
}

impl<'a> Allocator<'a> {
    /// Compute the rate snapshot at the allocation cutoff.
    ///
    /// A grant's effective rate is its per-token share times the number of
    /// universe tokens that actually have an owner — the rate it is live
    /// redirecting, not its configured maximum.
    pub fn rate_snapshot(&self) -> RateSnapshot {
        let cutoff = self.snapshot().cutoff;
        let mut grant_rates = Vec::new();
        let mut token_rates: BTreeMap<(Partition, TokenId), f64> = BTreeMap::new();

        for grant in &self.snapshot().grants {
            if !grant.participates_at(cutoff) {
                continue;
            }
            let denominator = self.denominator(grant);
            let expired = grant.window_end(cutoff) < cutoff;
            let per_token = if denominator == 0 || expired {
                0.0
            } else {
                grant.daily_rate / denominator as f64
            };

            let mut owned = 0u64;
            if per_token > 0.0 {
                for &token_id in self.universe(grant) {
                    let has_owner = self
                        .timeline(&grant.partition, token_id)
                        .and_then(|tl| tl.current_owner_at(cutoff))
                        .is_some();
                    if !has_owner {
                        continue;
                    }
                    owned += 1;
                    *token_rates
                        .entry((grant.partition.clone(), token_id))
                        .or_default() += per_token;
                }
            }

            grant_rates.push(GrantRateStat {
                grant_id: grant.id,
                grantor: grant.grantor,
                partition: grant.partition.clone(),
                daily_rate: per_token * owned as f64,
            });
        }

        RateSnapshot {
            grant_rates,
            token_rates: token_rates
                .into_iter()
                .map(|((partition, token_id), daily_rate)| TokenRateStat {
                    partition,
                    token_id,
                    daily_rate,
                })
                .collect(),
        }
    }
}
