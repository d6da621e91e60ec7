//! The in-memory input snapshot an allocation run computes over.

use std::collections::BTreeMap;

use xtdh_store::{
    CollectionMeta, CollectionStore, ConsolidationStore, Grant, GrantStore, IdentityStore,
    OwnershipEvent, OwnershipStore, StoreError, TokenMode,
};
use xtdh_types::{ConsolidationKey, GrantId, IdentityId, Partition, TokenId, Timestamp, WalletAddress};

/// Everything one recomputation reads, captured as plain collections.
///
/// The orchestrator assembles a snapshot from the stores inside the run's
/// transaction scope; the engine then computes over it without touching
/// storage again. Grants are kept sorted by id and all maps are B-trees so
/// traversal order — and therefore output — is fixed.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// The recomputation cutoff: the most recent UTC day boundary.
    pub cutoff: Timestamp,
    /// All grants, sorted by id. Eligibility filtering happens in the
    /// engine, not here.
    pub grants: Vec<Grant>,
    /// Enumerated token sets of `Include`-mode grants.
    pub grant_tokens: BTreeMap<GrantId, Vec<TokenId>>,
    /// The full ownership history feed.
    pub events: Vec<OwnershipEvent>,
    /// Wallet → consolidation key, as maintained by the external resolver.
    pub consolidation: BTreeMap<WalletAddress, ConsolidationKey>,
    /// Consolidation key → minted identity.
    pub identities: BTreeMap<ConsolidationKey, IdentityId>,
    /// Collection metadata by partition.
    pub collections: BTreeMap<Partition, CollectionMeta>,
}

impl Snapshot {
    pub fn new(cutoff: Timestamp) -> Self {
        Self {
            cutoff,
            ..Default::default()
        }
    }

    /// Sort grants by id. Called once after assembly; the engine assumes
    /// this order.
    pub fn normalize(&mut self) {
        self.grants.sort_by_key(|g| g.id);
    }

    /// Capture a snapshot from the stores.
    ///
    /// Any store failure aborts the whole recomputation — there is no
    /// partial-credit mode; the run is simply retried on the next
    /// schedule.
    pub fn load<S>(store: &S, cutoff: Timestamp) -> Result<Self, StoreError>
    where
        S: GrantStore + OwnershipStore + ConsolidationStore + IdentityStore + CollectionStore + ?Sized,
    {
        let mut snap = Snapshot::new(cutoff);
        snap.grants = store.iter_grants()?;
        for grant in &snap.grants {
            if grant.token_mode == TokenMode::Include {
                snap.grant_tokens.insert(grant.id, store.grant_tokens(grant.id)?);
            }
        }
        snap.events = store.iter_events()?;
        snap.consolidation = store.iter_mappings()?.into_iter().collect();
        snap.identities = store.iter_identities()?.into_iter().collect();
        snap.collections = store
            .iter_collections()?
            .into_iter()
            .map(|meta| (meta.partition.clone(), meta))
            .collect();
        snap.normalize();
        Ok(snap)
    }

    /// The effective consolidation key of a wallet: its mapped key, or the
    /// wallet's own singleton key when the resolver has no entry.
    pub fn effective_key(&self, wallet: &WalletAddress) -> ConsolidationKey {
        self.consolidation
            .get(wallet)
            .cloned()
            .unwrap_or_else(|| ConsolidationKey::from_wallet(wallet))
    }

    /// The identity registered for a wallet's effective key, if any.
    pub fn identity_of(&self, wallet: &WalletAddress) -> Option<IdentityId> {
        self.identities.get(&self.effective_key(wallet)).copied()
    }

    /// The enumerated token set of a grant (empty slice when none recorded).
    pub fn tokens_of(&self, grant: GrantId) -> &[TokenId] {
        self.grant_tokens
            .get(&grant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The total supply of a partition, or 0 when the collection is unknown.
    pub fn total_supply(&self, partition: &Partition) -> u64 {
        self.collections
            .get(partition)
            .map(|c| c.total_supply)
            .unwrap_or(0)
    }
}
