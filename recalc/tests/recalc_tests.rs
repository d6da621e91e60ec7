use std::sync::Arc;

use xtdh_nullables::{MemoryStore, NullClock};
use xtdh_recalc::{
    NoopRateReviewer, RateReviewer, Recalculator, ReviewError, StatsTrigger,
};
use xtdh_store::{
    BalanceStore, CollectionMeta, CollectionStore, ConsolidationStore, Grant, GrantStatus,
    GrantStore, IdentityStore, OwnershipEvent, OwnershipStore, TokenMode,
};
use xtdh_types::{ConsolidationKey, GrantId, IdentityId, Partition, TokenId, Timestamp, WalletAddress};

fn partition() -> Partition {
    Partition::new("0xc0ffee")
}

/// Grant G: ALL mode, rate 100/day, open-ended from day 0, over a
/// collection of supply 10; token T held by wallet 0xa1 (key k1) since
/// day 0 with no sale.
fn seed_scenario(store: &MemoryStore) {
    store
        .put_collection(&CollectionMeta {
            partition: partition(),
            total_supply: 10,
            base_daily_rate: 0.0,
        })
        .unwrap();
    store
        .put_mapping(&WalletAddress::new("0xa1"), &ConsolidationKey::new("k1"))
        .unwrap();
    let holder = store.ensure_identity(&ConsolidationKey::new("k1")).unwrap();
    let grantor = store.ensure_identity(&ConsolidationKey::new("k9")).unwrap();
    assert_eq!(holder, IdentityId::new(1));
    assert_eq!(grantor, IdentityId::new(2));
    store
        .put_event(&OwnershipEvent {
            partition: partition(),
            token_id: TokenId::new(1),
            owner: WalletAddress::new("0xa1"),
            since_time: Timestamp::from_days(0),
            since_block: 1,
            log_index: 0,
            acquired_as_sale: false,
        })
        .unwrap();
    store
        .put_grant(&Grant {
            id: GrantId::new(1),
            grantor,
            partition: partition(),
            token_mode: TokenMode::All,
            daily_rate: 100.0,
            valid_from: Timestamp::from_days(0),
            valid_to: None,
            status: GrantStatus::Granted,
        })
        .unwrap();
}

#[test]
fn end_to_end_scenario_credits_holder_and_debits_grantor() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);
    let clock = NullClock::at_day(10);

    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    let recalculator = Recalculator::new(
        store.clone(),
        Box::new(NoopRateReviewer),
        StatsTrigger::new(tx),
    );

    let summary = recalculator.run(clock.now()).unwrap();
    assert_eq!(summary.cutoff, Timestamp::from_days(10));
    assert_eq!(summary.identity_count, 2);

    // full_days = 10 − 0 − 1 = 9 → contribution (100/10) × 9 = 90.
    let holder = store.get_balance(IdentityId::new(1)).unwrap().unwrap();
    assert_eq!(holder.x_tdh, 90.0);
    assert_eq!(holder.granted_out, 0.0);

    let grantor = store.get_balance(IdentityId::new(2)).unwrap().unwrap();
    assert_eq!(grantor.granted_out, 90.0);
    assert_eq!(grantor.x_tdh, -90.0);

    // The stats trigger fired exactly once, after commit.
    let request = rx.try_recv().unwrap();
    assert_eq!(request.cutoff, Timestamp::from_days(10));
    assert!(rx.try_recv().is_err());
}

#[test]
fn cutoff_is_floored_to_day_boundary() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);
    let clock = NullClock::at_day(10);
    clock.advance(12_345);

    let recalculator = Recalculator::new(
        store.clone(),
        Box::new(NoopRateReviewer),
        StatsTrigger::disabled(),
    );
    let summary = recalculator.run(clock.now()).unwrap();
    assert_eq!(summary.cutoff, Timestamp::from_days(10));
}

#[test]
fn unmapped_wallet_gets_an_identity_minted() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);
    // A wallet the consolidation resolver does not know acquires token 2.
    store
        .put_event(&OwnershipEvent {
            partition: partition(),
            token_id: TokenId::new(2),
            owner: WalletAddress::new("0xdeadbeef"),
            since_time: Timestamp::from_days(3),
            since_block: 5,
            log_index: 0,
            acquired_as_sale: true,
        })
        .unwrap();

    let recalculator = Recalculator::new(
        store.clone(),
        Box::new(NoopRateReviewer),
        StatsTrigger::disabled(),
    );
    let summary = recalculator.run(Timestamp::from_days(10)).unwrap();
    assert_eq!(summary.minted, 1);

    let minted = store
        .get_identity(&ConsolidationKey::new("0xdeadbeef"))
        .unwrap()
        .expect("identity minted for unmapped wallet");
    // (100/10) × full_days(3, 10) = 10 × 6 = 60.
    let balance = store.get_balance(minted).unwrap().unwrap();
    assert_eq!(balance.x_tdh, 60.0);
}

#[test]
fn reruns_are_deterministic_and_idempotent() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);
    let recalculator = Recalculator::new(
        store.clone(),
        Box::new(NoopRateReviewer),
        StatsTrigger::disabled(),
    );

    recalculator.run(Timestamp::from_days(10)).unwrap();
    let first = store.iter_balances().unwrap();
    recalculator.run(Timestamp::from_days(10)).unwrap();
    let second = store.iter_balances().unwrap();
    assert_eq!(first, second);
}

struct FailingReviewer;

impl RateReviewer for FailingReviewer {
    fn review(&self, _cutoff: Timestamp) -> Result<(), ReviewError> {
        Err(ReviewError("review service unavailable".into()))
    }
}

#[test]
fn failed_review_aborts_run_and_leaves_balances_intact() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);

    let good = Recalculator::new(
        store.clone(),
        Box::new(NoopRateReviewer),
        StatsTrigger::disabled(),
    );
    good.run(Timestamp::from_days(10)).unwrap();
    let committed = store.iter_balances().unwrap();

    // Later data arrives, but the next run fails at the review step:
    // nothing may change.
    store
        .put_event(&OwnershipEvent {
            partition: partition(),
            token_id: TokenId::new(3),
            owner: WalletAddress::new("0xa1"),
            since_time: Timestamp::from_days(11),
            since_block: 9,
            log_index: 0,
            acquired_as_sale: false,
        })
        .unwrap();
    let bad = Recalculator::new(
        store.clone(),
        Box::new(FailingReviewer),
        StatsTrigger::disabled(),
    );
    assert!(bad.run(Timestamp::from_days(20)).is_err());
    assert_eq!(store.iter_balances().unwrap(), committed);
}

/// A reviewer that halves the rate of every grant it sees, standing in
/// for the external rate re-review step.
struct HalvingReviewer {
    store: Arc<MemoryStore>,
}

impl RateReviewer for HalvingReviewer {
    fn review(&self, _cutoff: Timestamp) -> Result<(), ReviewError> {
        for mut grant in self
            .store
            .iter_grants()
            .map_err(|e| ReviewError(e.to_string()))?
        {
            grant.daily_rate /= 2.0;
            self.store
                .put_grant(&grant)
                .map_err(|e| ReviewError(e.to_string()))?;
        }
        Ok(())
    }
}

#[test]
fn review_adjustments_are_read_back_into_the_snapshot() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);
    let recalculator = Recalculator::new(
        store.clone(),
        Box::new(HalvingReviewer {
            store: store.clone(),
        }),
        StatsTrigger::disabled(),
    );

    recalculator.run(Timestamp::from_days(10)).unwrap();
    // Rate was halved to 50 before the snapshot was read: (50/10) × 9 = 45.
    let holder = store.get_balance(IdentityId::new(1)).unwrap().unwrap();
    assert_eq!(holder.x_tdh, 45.0);
}

#[test]
fn disabled_trigger_never_fails_the_run() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);
    let recalculator = Recalculator::new(
        store.clone(),
        Box::new(NoopRateReviewer),
        StatsTrigger::disabled(),
    );
    assert!(recalculator.run(Timestamp::from_days(10)).is_ok());
}

#[test]
fn dropped_worker_never_fails_the_run() {
    let store = Arc::new(MemoryStore::new());
    seed_scenario(&store);
    let (tx, rx) = tokio::sync::mpsc::channel(1);
    drop(rx);
    let recalculator = Recalculator::new(
        store.clone(),
        Box::new(NoopRateReviewer),
        StatsTrigger::new(tx),
    );
    assert!(recalculator.run(Timestamp::from_days(10)).is_ok());
}
