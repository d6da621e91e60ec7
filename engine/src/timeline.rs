//! Per-token ownership timelines: current owner and reset-bounded
//! holding windows.

use std::collections::BTreeMap;

use crate::snapshot::Snapshot;
use xtdh_store::OwnershipEvent;
use xtdh_types::{Partition, TokenId, Timestamp};

/// The ownership history of one token, sorted by
/// `(since_time, since_block, log_index)`.
#[derive(Clone, Debug)]
pub struct TokenTimeline {
    pub partition: Partition,
    pub token_id: TokenId,
    events: Vec<OwnershipEvent>,
}

/// The counted holding window of a token's current owner at some cutoff.
#[derive(Clone, Debug)]
pub struct CountedWindow<'a> {
    /// The ownership event that made the current owner the owner.
    pub current: &'a OwnershipEvent,
    /// Start of the counted window: the most recent reset at or before the
    /// cutoff, or the token's very first event when no reset exists.
    pub start: Timestamp,
}

impl TokenTimeline {
    fn new(partition: Partition, token_id: TokenId) -> Self {
        Self {
            partition,
            token_id,
            events: Vec::new(),
        }
    }

    fn push(&mut self, event: OwnershipEvent) {
        self.events.push(event);
    }

    fn sort(&mut self) {
        self.events.sort_by_key(|e| e.ordering_key());
    }

    /// The event that made the current owner at `cutoff`, i.e. the event
    /// with the greatest ordering key strictly before the cutoff. `None`
    /// when the token had no owner yet.
    pub fn current_owner_at(&self, cutoff: Timestamp) -> Option<&OwnershipEvent> {
        self.events.iter().rev().find(|e| e.since_time < cutoff)
    }

    /// The counted holding window at `cutoff`.
    ///
    /// The window does not necessarily span the current owner's entire
    /// tenure: it resets at every monetary sale, and at every transfer that
    /// crossed between distinct consolidation keys — even a free one. A
    /// free transfer between wallets sharing a consolidation key does not
    /// reset.
    pub fn counted_window_at(&self, cutoff: Timestamp, snapshot: &Snapshot) -> Option<CountedWindow<'_>> {
        let visible: Vec<&OwnershipEvent> = self
            .events
            .iter()
            .filter(|e| e.since_time < cutoff)
            .collect();
        let current = *visible.last()?;

        let mut start = visible[0].since_time;
        for pair in visible.windows(2) {
            let (prev, event) = (pair[0], pair[1]);
            let crossed = snapshot.effective_key(&event.owner) != snapshot.effective_key(&prev.owner);
            if event.acquired_as_sale || crossed {
                start = event.since_time;
            }
        }

        Some(CountedWindow { current, start })
    }
}

/// Group the snapshot's events into per-token timelines.
///
/// Events are sorted within each timeline; ties on `since_time` are broken
/// by block number then log position, newest wins.
pub fn build_timelines(events: &[OwnershipEvent]) -> BTreeMap<(Partition, TokenId), TokenTimeline> {
    let mut timelines: BTreeMap<(Partition, TokenId), TokenTimeline> = BTreeMap::new();
    for event in events {
        timelines
            .entry((event.partition.clone(), event.token_id))
            .or_insert_with(|| TokenTimeline::new(event.partition.clone(), event.token_id))
            .push(event.clone());
    }
    for timeline in timelines.values_mut() {
        timeline.sort();
    }
    timelines
}

#[cfg(test)]
mod tests {
    use super::*;
    use xtdh_types::{ConsolidationKey, WalletAddress};

    fn event(token: u64, owner: &str, day: u64, block: u64, sale: bool) -> OwnershipEvent {
        OwnershipEvent {
            partition: Partition::new("0xc0ffee"),
            token_id: TokenId::new(token),
            owner: WalletAddress::new(owner),
            since_time: Timestamp::from_days(day),
            since_block: block,
            log_index: 0,
            acquired_as_sale: sale,
        }
    }

    fn snapshot_with_keys(pairs: &[(&str, &str)]) -> Snapshot {
        let mut snap = Snapshot::new(Timestamp::from_days(100));
        for (wallet, key) in pairs {
            snap.consolidation
                .insert(WalletAddress::new(*wallet), ConsolidationKey::new(*key));
        }
        snap
    }

    #[test]
    fn current_owner_is_strictly_before_cutoff() {
        let events = vec![event(1, "0xaa", 0, 1, false), event(1, "0xbb", 10, 2, true)];
        let timelines = build_timelines(&events);
        let tl = timelines.values().next().unwrap();

        // An event landing exactly on the cutoff is not yet visible.
        let at_ten = tl.current_owner_at(Timestamp::from_days(10)).unwrap();
        assert_eq!(at_ten.owner, WalletAddress::new("0xaa"));

        let past_ten = tl.current_owner_at(Timestamp::from_days(11)).unwrap();
        assert_eq!(past_ten.owner, WalletAddress::new("0xbb"));

        assert!(tl.current_owner_at(Timestamp::from_days(0)).is_none());
    }

    #[test]
    fn ties_break_by_block_then_log_index() {
        let mut a = event(1, "0xaa", 5, 100, false);
        a.log_index = 3;
        let mut b = event(1, "0xbb", 5, 100, false);
        b.log_index = 7;
        let timelines = build_timelines(&[a, b]);
        let tl = timelines.values().next().unwrap();
        let current = tl.current_owner_at(Timestamp::from_days(6)).unwrap();
        assert_eq!(current.owner, WalletAddress::new("0xbb"));
    }

    #[test]
    fn sale_resets_window() {
        let events = vec![event(1, "0xaa", 0, 1, false), event(1, "0xbb", 4, 2, true)];
        let snap = snapshot_with_keys(&[("0xaa", "k1"), ("0xbb", "k2")]);
        let timelines = build_timelines(&events);
        let tl = timelines.values().next().unwrap();
        let window = tl.counted_window_at(Timestamp::from_days(10), &snap).unwrap();
        assert_eq!(window.start, Timestamp::from_days(4));
        assert_eq!(window.current.owner, WalletAddress::new("0xbb"));
    }

    #[test]
    fn same_key_free_transfer_does_not_reset() {
        // A sold to B, then free transfer B → C where C shares B's key:
        // the window resets at the sale, not at the transfer.
        let events = vec![
            event(1, "0xaa", 0, 1, false),
            event(1, "0xbb", 4, 2, true),
            event(1, "0xcc", 7, 3, false),
        ];
        let snap = snapshot_with_keys(&[("0xaa", "k1"), ("0xbb", "k2"), ("0xcc", "k2")]);
        let timelines = build_timelines(&events);
        let tl = timelines.values().next().unwrap();
        let window = tl.counted_window_at(Timestamp::from_days(10), &snap).unwrap();
        assert_eq!(window.start, Timestamp::from_days(4));
        assert_eq!(window.current.owner, WalletAddress::new("0xcc"));
    }

    #[test]
    fn cross_key_free_transfer_resets() {
        let events = vec![event(1, "0xaa", 0, 1, false), event(1, "0xbb", 6, 2, false)];
        let snap = snapshot_with_keys(&[("0xaa", "k1"), ("0xbb", "k2")]);
        let timelines = build_timelines(&events);
        let tl = timelines.values().next().unwrap();
        let window = tl.counted_window_at(Timestamp::from_days(10), &snap).unwrap();
        assert_eq!(window.start, Timestamp::from_days(6));
    }

    #[test]
    fn no_reset_means_first_event_starts_window() {
        let events = vec![event(1, "0xaa", 2, 1, false)];
        let snap = snapshot_with_keys(&[("0xaa", "k1")]);
        let timelines = build_timelines(&events);
        let tl = timelines.values().next().unwrap();
        let window = tl.counted_window_at(Timestamp::from_days(10), &snap).unwrap();
        assert_eq!(window.start, Timestamp::from_days(2));
    }

    #[test]
    fn unmapped_wallets_fall_back_to_singleton_keys() {
        // Neither wallet is in the consolidation mapping; their singleton
        // keys differ, so the free transfer still resets.
        let events = vec![event(1, "0xaa", 0, 1, false), event(1, "0xbb", 3, 2, false)];
        let snap = snapshot_with_keys(&[]);
        let timelines = build_timelines(&events);
        let tl = timelines.values().next().unwrap();
        let window = tl.counted_window_at(Timestamp::from_days(10), &snap).unwrap();
        assert_eq!(window.start, Timestamp::from_days(3));
    }
}
