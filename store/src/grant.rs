//! Grant rows and storage trait.

use serde::{Deserialize, Serialize};

use crate::StoreError;
use xtdh_types::{GrantId, IdentityId, Partition, TokenId, Timestamp};

/// How a grant selects tokens within its target partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenMode {
    /// Every token in the collection; the denominator is the collection's
    /// total supply.
    All,
    /// An explicitly enumerated token set (see [`GrantTokenRow`]); the
    /// denominator is the size of that set.
    Include,
}

/// Lifecycle status of a grant. Only `Granted` grants participate in the
/// recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantStatus {
    Pending,
    Granted,
    Revoked,
}

/// A promise by one identity to redirect part of the xTDH it produces to
/// whoever ends up holding specific tokens.
///
/// Created and edited by grant-management flows outside this engine;
/// read-only here apart from the rate re-review step that runs immediately
/// before a recomputation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub grantor: IdentityId,
    pub partition: Partition,
    pub token_mode: TokenMode,
    /// Daily rate redirected by this grant, split evenly across the
    /// denominator.
    pub daily_rate: f64,
    pub valid_from: Timestamp,
    /// Open-ended when `None`.
    pub valid_to: Option<Timestamp>,
    pub status: GrantStatus,
}

impl Grant {
    /// Whether this grant participates in a recomputation at `cutoff`.
    ///
    /// A grant never participates before its own `valid_from`; the
    /// comparison is strict, so a grant starting exactly at the cutoff
    /// waits for the next run.
    pub fn participates_at(&self, cutoff: Timestamp) -> bool {
        self.status == GrantStatus::Granted && self.valid_from < cutoff
    }

    /// End of the grant's validity window, clipped to `cutoff`.
    pub fn window_end(&self, cutoff: Timestamp) -> Timestamp {
        match self.valid_to {
            Some(until) if until < cutoff => until,
            _ => cutoff,
        }
    }
}

/// Enumerates one included token of an `Include`-mode grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantTokenRow {
    pub grant_id: GrantId,
    pub token_id: TokenId,
}

/// Trait for persisting grants and their token enumerations.
pub trait GrantStore {
    /// Insert or overwrite a grant.
    fn put_grant(&self, grant: &Grant) -> Result<(), StoreError>;

    /// Get a grant by id.
    fn get_grant(&self, id: GrantId) -> Result<Option<Grant>, StoreError>;

    /// All grants, ordered by id.
    fn iter_grants(&self) -> Result<Vec<Grant>, StoreError>;

    /// Record one enumerated token for an `Include`-mode grant.
    fn put_grant_token(&self, row: &GrantTokenRow) -> Result<(), StoreError>;

    /// The enumerated token set of a grant, ordered by token id.
    fn grant_tokens(&self, id: GrantId) -> Result<Vec<TokenId>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(status: GrantStatus, valid_from: u64) -> Grant {
        Grant {
            id: GrantId::new(1),
            grantor: IdentityId::new(7),
            partition: Partition::new("0xc0ffee"),
            token_mode: TokenMode::All,
            daily_rate: 50.0,
            valid_from: Timestamp::new(valid_from),
            valid_to: None,
            status,
        }
    }

    #[test]
    fn participation_requires_granted_status() {
        let cutoff = Timestamp::from_days(5);
        assert!(grant(GrantStatus::Granted, 0).participates_at(cutoff));
        assert!(!grant(GrantStatus::Pending, 0).participates_at(cutoff));
        assert!(!grant(GrantStatus::Revoked, 0).participates_at(cutoff));
    }

    #[test]
    fn participation_is_strict_before_cutoff() {
        let cutoff = Timestamp::from_days(5);
        assert!(!grant(GrantStatus::Granted, cutoff.as_secs()).participates_at(cutoff));
        assert!(grant(GrantStatus::Granted, cutoff.as_secs() - 1).participates_at(cutoff));
    }

    #[test]
    fn window_end_clips_to_cutoff() {
        let cutoff = Timestamp::from_days(10);
        let mut g = grant(GrantStatus::Granted, 0);
        assert_eq!(g.window_end(cutoff), cutoff);
        g.valid_to = Some(Timestamp::from_days(4));
        assert_eq!(g.window_end(cutoff), Timestamp::from_days(4));
        g.valid_to = Some(Timestamp::from_days(20));
        assert_eq!(g.window_end(cutoff), cutoff);
    }
}
