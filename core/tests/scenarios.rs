use chrono::NaiveDate;
use posledger_core::{ColdpathOutcome, ColdpathRecalculator, HotpathApplier, HotpathOutcome, LedgerConfig};
use posledger_execution::{InMemoryEventStore, InMemoryIdempotencyRegistry, InMemorySnapshotStore};
use posledger_instrument::{PositionStatus, ReconciliationStatus, TradeEvent, TradeType};
use posledger_integration::noop::NoopContractRulesProvider;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn trade(
    trade_id: &str,
    trade_type: TradeType,
    quantity: rust_decimal::Decimal,
    price: rust_decimal::Decimal,
    trade_date: NaiveDate,
) -> TradeEvent {
    TradeEvent::new(
        trade_id.into(),
        "ACC1".into(),
        "AAPL".into(),
        "USD".into(),
        trade_type,
        quantity,
        price,
        trade_date,
    )
}

struct Harness {
    events: InMemoryEventStore,
    snapshots: InMemorySnapshotStore,
    idempotency: InMemoryIdempotencyRegistry,
    contract_rules: NoopContractRulesProvider,
    config: LedgerConfig,
}

impl Harness {
    fn new() -> Self {
        Self {
            events: InMemoryEventStore::new(),
            snapshots: InMemorySnapshotStore::new(),
            idempotency: InMemoryIdempotencyRegistry::new(),
            contract_rules: NoopContractRulesProvider,
            config: LedgerConfig::default(),
        }
    }

    fn applier(&self) -> HotpathApplier<'_> {
        HotpathApplier {
            events: &self.events,
            snapshots: &self.snapshots,
            idempotency: &self.idempotency,
            contract_rules: &self.contract_rules,
            config: self.config.clone(),
        }
    }

    fn coldpath(&self) -> ColdpathRecalculator<'_> {
        ColdpathRecalculator {
            events: &self.events,
            snapshots: &self.snapshots,
            idempotency: &self.idempotency,
            contract_rules: &self.contract_rules,
            uti_index: None,
            config: self.config.coldpath,
        }
    }
}

/// Scenarios 1-4 and 6 from spec §8, chained against one harness.
#[test]
fn full_lifecycle_then_sign_change_split_then_duplicate() {
    let h = Harness::new();

    // 1. NEW_TRADE +100 @ 50.00.
    let t1 = trade("t1", TradeType::NewTrade, dec!(100), dec!(50.00), date(2025, 1, 10));
    let r1 = h.applier().apply(t1.clone(), date(2025, 1, 10)).unwrap();
    let snap1 = match r1.outcome {
        HotpathOutcome::Applied { snapshot } => snapshot,
        other => panic!("expected Applied, got {other:?}"),
    };
    assert_eq!(snap1.last_ver, 1);
    assert_eq!(snap1.status, PositionStatus::Active);
    assert_eq!(snap1.reconciliation_status, ReconciliationStatus::Reconciled);
    assert_eq!(snap1.summary_metrics.total_qty, dec!(100));
    let position_key = snap1.position_key.clone();

    // 2. INCREASE +50 @ 55.00.
    let t2 = trade("t2", TradeType::Increase, dec!(50), dec!(55.00), date(2025, 1, 15));
    let r2 = h.applier().apply(t2, date(2025, 1, 15)).unwrap();
    let snap2 = match r2.outcome {
        HotpathOutcome::Applied { snapshot } => snapshot,
        other => panic!("expected Applied, got {other:?}"),
    };
    assert_eq!(snap2.summary_metrics.total_qty, dec!(150));

    // 3. DECREASE -120 @ 60.00, FIFO: closes lot1 (pnl 1000), lot2 -> 30 remaining.
    let t3 = trade("t3", TradeType::Decrease, dec!(-120), dec!(60.00), date(2025, 1, 20));
    let r3 = h.applier().apply(t3, date(2025, 1, 20)).unwrap();
    let snap3 = match r3.outcome {
        HotpathOutcome::Applied { snapshot } => snapshot,
        other => panic!("expected Applied, got {other:?}"),
    };
    assert_eq!(snap3.last_ver, 3);
    assert_eq!(snap3.summary_metrics.total_qty, dec!(30));

    // 4. DECREASE -50 @ 58.00: closes remaining 30 (pnl 90), overflow 20 splits sign.
    let t4 = trade("t4", TradeType::Decrease, dec!(-50), dec!(58.00), date(2025, 1, 25));
    let r4 = h.applier().apply(t4, date(2025, 1, 25)).unwrap();
    let (closed, opened) = match r4.outcome {
        HotpathOutcome::SignChangeSplit { closed, opened } => (closed, opened),
        other => panic!("expected SignChangeSplit, got {other:?}"),
    };
    assert_eq!(closed.position_key, position_key);
    assert_eq!(closed.status, PositionStatus::Terminated);
    assert_eq!(closed.summary_metrics.total_qty, dec!(0));
    assert_ne!(opened.position_key, position_key);
    assert_eq!(opened.status, PositionStatus::Active);
    assert_eq!(opened.summary_metrics.total_qty, dec!(-20));
    assert_eq!(opened.uti, "t4");

    // 6. Duplicate submission of scenario-1's trade.
    let dup = h.applier().apply(t1, date(2025, 1, 10)).unwrap();
    match dup.outcome {
        HotpathOutcome::Duplicate { snapshot } => assert_eq!(snapshot.position_key, position_key),
        other => panic!("expected Duplicate, got {other:?}"),
    }
}

#[test]
fn backdated_trade_routes_through_coldpath_and_corrects_snapshot() {
    let h = Harness::new();

    let t1 = trade("b1", TradeType::NewTrade, dec!(100), dec!(50.00), date(2025, 1, 10));
    let r1 = h.applier().apply(t1, date(2025, 1, 20)).unwrap();
    let position_key = match r1.outcome {
        HotpathOutcome::Applied { snapshot } => snapshot.position_key,
        other => panic!("expected Applied, got {other:?}"),
    };

    // A later current-dated trade establishes a snapshot date the next one
    // can be backdated against.
    let t2 = trade("b2", TradeType::Increase, dec!(50), dec!(55.00), date(2025, 1, 15));
    h.applier().apply(t2, date(2025, 1, 20)).unwrap();

    let backdated = trade("b3", TradeType::Increase, dec!(25), dec!(52.00), date(2025, 1, 12));
    let routed = h.applier().apply(backdated.clone(), date(2025, 1, 20)).unwrap();
    let provisional = match routed.outcome {
        HotpathOutcome::RoutedToColdpath { provisional } => provisional,
        other => panic!("expected RoutedToColdpath, got {other:?}"),
    };
    assert_eq!(provisional.reconciliation_status, ReconciliationStatus::Provisional);
    assert_eq!(provisional.provisional_trade_id, Some("b3".into()));

    // The hotpath's provisional write already folded the backdated quantity
    // in (just under RECONCILIATION=PROVISIONAL); the coldpath's replay only
    // re-establishes chronological lot order and flips reconciliation to
    // RECONCILED, so the total itself does not move again here.
    let result = h.coldpath().recalculate(&position_key, backdated).unwrap();
    match result.outcome {
        ColdpathOutcome::Corrected { snapshot, qty_delta, .. } => {
            assert_eq!(snapshot.reconciliation_status, ReconciliationStatus::Reconciled);
            assert_eq!(snapshot.summary_metrics.total_qty, dec!(175));
            assert_eq!(qty_delta, dec!(0));
        }
        other => panic!("expected Corrected, got {other:?}"),
    }

    // Re-running the same backdated trade through the coldpath is a no-op.
    let duplicate = trade("b3", TradeType::Increase, dec!(25), dec!(52.00), date(2025, 1, 12));
    let repeat = h.coldpath().recalculate(&position_key, duplicate).unwrap();
    assert!(matches!(repeat.outcome, ColdpathOutcome::Duplicate));
}
