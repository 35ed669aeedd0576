use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use posledger_execution::{EventStore, IdempotencyRegistry, SnapshotStore, StoreError};
use posledger_instrument::{
    Direction, EventRecord, EventType, IdempotencyRecord, IdempotencyStatus, PositionKey,
    PositionState, PositionStatus, ReconciliationStatus, SnapshotRecord, TradeEvent, TradeType,
    UpiHistoryRecord,
};
use posledger_integration::{BackoffPolicy, ContractRulesProvider};
use posledger_risk::resolve_tax_lot_method;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::ColdpathConfig;
use crate::engine::materialize::{build_snapshot_record, summary_metrics, update_schedule};
use crate::engine::tax_lot::{add_lot, reduce_lots};
use crate::engine::upi::UpiRecorder;
use crate::error::LedgerError;

/// Resolves the position key of a counterpart position sharing the same
/// UTI, for merge detection only (spec §4.8: "Detection only; no data
/// movement in the core").
pub trait UtiIndex: Send + Sync {
    fn find_other_with_uti(&self, uti: &str, exclude: &PositionKey) -> Option<PositionKey>;
}

#[derive(Debug, Clone)]
pub enum ColdpathOutcome {
    /// Idempotency hit — the backdated trade's `trade_id` was already
    /// processed; no new event, no snapshot change.
    Duplicate,
    Corrected {
        snapshot: SnapshotRecord,
        previous_version: u64,
        qty_delta: Decimal,
        exposure_delta: Decimal,
        lot_count_delta: i64,
        corrected_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct ColdpathResult {
    pub outcome: ColdpathOutcome,
    pub upi_history: Vec<UpiHistoryRecord>,
}

/// Chronological-replay recalculator triggered by a backdated trade
/// (spec §4.8, C9).
pub struct ColdpathRecalculator<'a> {
    pub events: &'a dyn EventStore,
    pub snapshots: &'a dyn SnapshotStore,
    pub idempotency: &'a dyn IdempotencyRegistry,
    pub contract_rules: &'a dyn ContractRulesProvider,
    pub uti_index: Option<&'a dyn UtiIndex>,
    pub config: ColdpathConfig,
}

impl<'a> ColdpathRecalculator<'a> {
    pub fn recalculate(
        &self,
        position_key: &PositionKey,
        trade: TradeEvent,
    ) -> Result<ColdpathResult, LedgerError> {
        if let Some(existing) = self.idempotency.lookup(&trade.trade_id) {
            if existing.status == IdempotencyStatus::Processed {
                return Ok(ColdpathResult {
                    outcome: ColdpathOutcome::Duplicate,
                    upi_history: Vec::new(),
                });
            }
        }

        // Step 1-2: load the stream, inject the backdated event if absent.
        self.inject_if_missing(position_key, &trade)?;

        // Step 3: reload, sort for chronological replay.
        let mut events = self.events.load_all(position_key);
        events.sort_by(|a, b| {
            a.effective_date
                .cmp(&b.effective_date)
                .then_with(|| a.occurred_at.cmp(&b.occurred_at))
                .then_with(|| a.event_ver.cmp(&b.event_ver))
        });

        // Step 4: replay from empty.
        let (state, uti, status) = self.replay(position_key, &trade, &events)?;

        // Step 5: deltas vs the snapshot as it stood before this correction.
        let previous_snapshot = self.snapshots.load(position_key);
        let previous_metrics = previous_snapshot
            .as_ref()
            .map(|s| s.summary_metrics)
            .unwrap_or_default();
        let new_metrics = summary_metrics(&state, Decimal::ZERO);
        let qty_delta = new_metrics.total_qty - previous_metrics.total_qty;
        let exposure_delta = new_metrics.exposure - previous_metrics.exposure;
        let lot_count_delta = new_metrics.lot_count as i64 - previous_metrics.lot_count as i64;
        let previous_version = previous_snapshot.as_ref().map(|s| s.version).unwrap_or(0);

        // Step 6: CAS the corrected snapshot, retrying on conflict.
        let mut attempt = 0u32;
        let corrected = loop {
            attempt += 1;
            let current = self.snapshots.load(position_key);
            let expected_version = current.as_ref().map(|s| s.version).unwrap_or(0);
            let now = Utc::now();
            let snapshot = build_snapshot_record(
                &state,
                events.len() as u64,
                uti.clone(),
                status,
                ReconciliationStatus::Reconciled,
                None,
                expected_version,
                now,
                Decimal::ZERO,
            );
            match self.snapshots.upsert(snapshot.clone(), expected_version) {
                Ok(()) => {
                    let mut persisted = snapshot;
                    persisted.version = expected_version + 1;
                    break persisted;
                }
                Err(StoreError::VersionConflict { .. }) if attempt < self.config.max_attempts => {
                    let policy = BackoffPolicy::Linear { step_ms: self.config.backoff_step_ms };
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(attempt, ?delay, %position_key, "coldpath optimistic conflict, retrying");
                    thread::sleep(delay);
                }
                Err(err) => return Err(err.into()),
            }
        };

        // Step 7: mark idempotency PROCESSED.
        if let Err(err) = self.idempotency.record(IdempotencyRecord {
            trade_id: trade.trade_id.clone(),
            position_key: position_key.clone(),
            event_version: corrected.last_ver,
            status: IdempotencyStatus::Processed,
            processed_at: Utc::now(),
            error_message: None,
        }) {
            warn!(trade_id = %trade.trade_id, %err, "idempotency record already present");
        }

        let mut upi = UpiRecorder::new();
        if let Some(index) = self.uti_index {
            if let Some(other) = index.find_other_with_uti(&uti, position_key) {
                upi.record_merged(
                    position_key.clone(),
                    uti.clone(),
                    other,
                    trade.trade_id.clone(),
                    trade.effective_date(),
                    Utc::now(),
                );
            }
        }

        info!(
            %position_key,
            %qty_delta,
            %exposure_delta,
            lot_count_delta,
            "historical position corrected"
        );

        Ok(ColdpathResult {
            outcome: ColdpathOutcome::Corrected {
                snapshot: corrected,
                previous_version,
                qty_delta,
                exposure_delta,
                lot_count_delta,
                corrected_at: Utc::now(),
            },
            upi_history: upi.history,
        })
    }

    fn inject_if_missing(&self, position_key: &PositionKey, trade: &TradeEvent) -> Result<(), LedgerError> {
        let existing = self.events.load_all(position_key);
        if existing.iter().any(|e| e.payload.trade_id == trade.trade_id) {
            return Ok(());
        }

        // Backdated events sort before same-day current events under replay
        // ordering because they are stamped at midnight UTC (spec §4.8).
        let occurred_at = Utc
            .from_utc_datetime(&trade.effective_date().and_hms_opt(0, 0, 0).expect("valid midnight"));

        let event_ver = self.events.next_version(position_key);
        self.events.append(EventRecord {
            position_key: position_key.clone(),
            event_ver,
            event_type: EventType::HistoricalCorrection,
            effective_date: trade.effective_date(),
            occurred_at,
            payload: trade.clone(),
            meta_lots: Vec::new(),
            correlation_id: trade.correlation_id.clone(),
            causation_id: trade.causation_id.clone(),
            contract_id: trade.contract_id.clone(),
        })?;
        Ok(())
    }

    fn replay(
        &self,
        position_key: &PositionKey,
        seed_trade: &TradeEvent,
        events: &[EventRecord],
    ) -> Result<(PositionState, String, PositionStatus), LedgerError> {
        let mut state = PositionState::empty(
            position_key.clone(),
            seed_trade.account.clone(),
            seed_trade.instrument.clone(),
            seed_trade.currency.clone(),
        );
        let mut uti = String::new();
        let mut status = PositionStatus::Terminated;
        let mut seen_first = false;

        for event in events {
            let _span = tracing::debug_span!(
                crate::logging::COLDPATH_REPLAY_EVENT_SPAN_NAME,
                event_ver = event.event_ver
            )
            .entered();
            let trade = &event.payload;
            let method = resolve_tax_lot_method(self.contract_rules, trade.contract_id.as_deref());
            let current_direction = Direction::from_signed_qty(state.total_qty());
            let same_direction_or_new = current_direction
                .map(|d| Direction::from_signed_qty(trade.quantity) == Some(d))
                .unwrap_or(true);

            if same_direction_or_new {
                add_lot(&mut state, trade.quantity, trade.price, trade.trade_date, trade.settlement_date);
            } else {
                reduce_lots(&mut state, trade.quantity.abs(), method, trade.price)?;
            }
            update_schedule(&mut state, trade);

            if !seen_first {
                uti = trade.trade_id.clone();
                status = PositionStatus::Active;
                seen_first = true;
            } else if status == PositionStatus::Active && state.total_qty().is_zero() {
                status = PositionStatus::Terminated;
            } else if status == PositionStatus::Terminated && trade.trade_type == TradeType::NewTrade {
                uti = trade.trade_id.clone();
                status = PositionStatus::Active;
            }
        }

        Ok((state, uti, status))
    }
}
