use std::thread;

use chrono::{NaiveDate, Utc};
use posledger_execution::{EventStore, IdempotencyRegistry, SnapshotStore};
use posledger_instrument::{
    Classification, Direction, EventRecord, EventType, IdempotencyRecord, IdempotencyStatus,
    PositionKey, PositionState, PositionStatus, ReconciliationStatus, SnapshotRecord, TradeEvent,
    UpiHistoryRecord,
};
use posledger_integration::{BackoffPolicy, ContractRulesProvider};
use posledger_risk::{resolve_tax_lot_method, Validator};
use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::engine::classifier::classify;
use crate::engine::materialize::{build_snapshot_record, update_schedule};
use crate::engine::snapshot_codec::inflate;
use crate::engine::tax_lot::{add_lot, reduce_lots};
use crate::engine::upi::UpiRecorder;
use crate::error::LedgerError;

/// Result of a successful hotpath application (spec §4.6).
#[derive(Debug, Clone)]
pub enum HotpathOutcome {
    /// Idempotency hit — no new state was written.
    Duplicate { snapshot: SnapshotRecord },
    /// Normal current/forward-dated application.
    Applied { snapshot: SnapshotRecord },
    /// Backdated trade: a provisional snapshot was written and the trade
    /// must be routed to the coldpath (`backdated-trades` stream, spec §6).
    RoutedToColdpath { provisional: SnapshotRecord },
    /// The trade flipped the position's sign: the old position was closed
    /// and a new one opened on a new position key (spec §4.6).
    SignChangeSplit {
        closed: SnapshotRecord,
        opened: SnapshotRecord,
    },
}

#[derive(Debug, Clone)]
pub struct HotpathResult {
    pub outcome: HotpathOutcome,
    pub upi_history: Vec<UpiHistoryRecord>,
}

/// Wires together the validator, tax-lot engine, snapshot codec, event
/// store, snapshot store, and idempotency registry into the transactional
/// per-trade sequence from spec §4.6.
pub struct HotpathApplier<'a> {
    pub events: &'a dyn EventStore,
    pub snapshots: &'a dyn SnapshotStore,
    pub idempotency: &'a dyn IdempotencyRegistry,
    pub contract_rules: &'a dyn ContractRulesProvider,
    pub config: LedgerConfig,
}

impl<'a> HotpathApplier<'a> {
    /// Applies `trade`, retrying on concurrency-conflict signals per
    /// `config.hotpath` (spec §4.6: up to 5 attempts, 25ms base ×1.5, cap
    /// 200ms — only retried for conflicts, never for validation failures).
    pub fn apply(&self, trade: TradeEvent, today: NaiveDate) -> Result<HotpathResult, LedgerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_apply_once(&trade, today) {
                Ok(result) => return Ok(result),
                Err(err) if err.is_retryable() && attempt < self.config.hotpath.max_attempts => {
                    let policy = BackoffPolicy::Exponential {
                        base_ms: self.config.hotpath.backoff_base_ms,
                        multiplier: self.config.hotpath.backoff_multiplier,
                        cap_ms: self.config.hotpath.backoff_cap_ms,
                    };
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(attempt, ?delay, trade_id = %trade.trade_id, "hotpath concurrency conflict, retrying");
                    thread::sleep(delay);
                }
                Err(LedgerError::ConcurrencyConflict(_)) => {
                    return Err(LedgerError::SystemUnavailable {
                        position_key: trade
                            .position_key
                            .as_ref()
                            .map(|k| k.as_str().to_string())
                            .unwrap_or_default(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn try_apply_once(&self, trade: &TradeEvent, today: NaiveDate) -> Result<HotpathResult, LedgerError> {
        // Step 1: validate fields.
        let validator = Validator {
            max_price: self.config.validator.max_price,
            max_future_years: self.config.validator.max_future_years,
        };
        let field_errors = validator.validate_fields(trade, today);
        if !field_errors.is_empty() {
            return Err(LedgerError::Validation(field_errors));
        }

        // Step 2: idempotency gate.
        if let Some(existing) = self.idempotency.lookup(&trade.trade_id) {
            if existing.status == IdempotencyStatus::Processed {
                let snapshot = self
                    .snapshots
                    .load(&existing.position_key)
                    .ok_or_else(|| {
                        LedgerError::DataInvariantViolation(format!(
                            "idempotency record for {} has no matching snapshot",
                            trade.trade_id
                        ))
                    })?;
                return Ok(HotpathResult {
                    outcome: HotpathOutcome::Duplicate { snapshot },
                    upi_history: Vec::new(),
                });
            }
        }

        // Step 3: resolve position_key, load current state.
        let position_key = self.resolve_position_key(trade);
        let existing_snapshot = self.snapshots.load(&position_key);
        let mut state = self.materialize_state(&position_key, trade, existing_snapshot.as_ref())?;
        let current_direction = Direction::from_signed_qty(state.total_qty());

        let state_errors =
            validator.validate_against_state(trade, &state, current_direction, self.config.allow_sign_change_split);
        if !state_errors.is_empty() {
            return Err(LedgerError::Validation(state_errors));
        }

        // Step 4: classify.
        let classification = classify(trade.effective_date(), today, state.latest_open_trade_date());

        let method = resolve_tax_lot_method(self.contract_rules, trade.contract_id.as_deref());
        let now = Utc::now();
        let mut upi = UpiRecorder::new();

        if classification == Classification::Backdated {
            let provisional = self.apply_and_persist(
                &mut state,
                trade,
                method,
                existing_snapshot.as_ref(),
                EventType::Provisional,
                ReconciliationStatus::Provisional,
                Some(trade.trade_id.clone()),
                now,
                &mut upi,
            )?;
            // Idempotency is left unmarked here: the coldpath recalculator
            // owns the PROCESSED record for a backdated trade_id once it has
            // actually replayed and persisted the correction (spec §4.8).
            info!(trade_id = %trade.trade_id, position_key = %provisional.position_key, "routed backdated trade to coldpath");
            return Ok(HotpathResult {
                outcome: HotpathOutcome::RoutedToColdpath { provisional },
                upi_history: upi.history,
            });
        }

        // Steps 5-6: would-be new total, detect sign change.
        let new_total = state.total_qty() + trade.quantity;
        let sign_changes = match current_direction {
            Some(direction) => {
                Direction::from_signed_qty(new_total).is_some_and(|new_dir| new_dir != direction)
            }
            None => false,
        };

        if sign_changes {
            let (closed, opened) = self.apply_sign_change_split(
                &mut state,
                trade,
                method,
                existing_snapshot.as_ref(),
                current_direction.expect("sign_changes implies a prior direction"),
                now,
                &mut upi,
            )?;
            self.mark_processed(trade, &opened.position_key, None);
            return Ok(HotpathResult {
                outcome: HotpathOutcome::SignChangeSplit { closed, opened },
                upi_history: upi.history,
            });
        }

        let snapshot = self.apply_and_persist(
            &mut state,
            trade,
            method,
            existing_snapshot.as_ref(),
            EventType::Applied,
            ReconciliationStatus::Reconciled,
            None,
            now,
            &mut upi,
        )?;
        self.mark_processed(trade, &snapshot.position_key, None);
        Ok(HotpathResult {
            outcome: HotpathOutcome::Applied { snapshot },
            upi_history: upi.history,
        })
    }

    /// Appends an event for `trade_id` to `position_key`'s log unless one is
    /// already there, returning its `event_ver` either way. A retried
    /// `try_apply_once` (e.g. after a snapshot CAS conflict) calls this with
    /// the same `trade_id` it already appended on the failed attempt; this
    /// keeps `last_ver = count(events)` and at most one event per `trade_id`
    /// instead of appending a second event for the retry (spec §8.1/§8.4).
    fn append_idempotent(
        &self,
        position_key: &PositionKey,
        trade_id: &str,
        build: impl FnOnce(u64) -> EventRecord,
    ) -> Result<u64, LedgerError> {
        if let Some(existing) = self
            .events
            .load_all(position_key)
            .into_iter()
            .find(|e| e.payload.trade_id == trade_id)
        {
            return Ok(existing.event_ver);
        }
        let event_ver = self.events.next_version(position_key);
        self.events.append(build(event_ver))?;
        Ok(event_ver)
    }

    fn resolve_position_key(&self, trade: &TradeEvent) -> PositionKey {
        trade.position_key.clone().unwrap_or_else(|| {
            let direction = Direction::from_signed_qty(trade.quantity)
                .expect("validator already rejected zero quantity");
            PositionKey::generate(&trade.account, &trade.instrument, &trade.currency, direction)
        })
    }

    fn materialize_state(
        &self,
        position_key: &PositionKey,
        trade: &TradeEvent,
        existing: Option<&SnapshotRecord>,
    ) -> Result<PositionState, LedgerError> {
        match existing {
            Some(snapshot) => {
                let lots = inflate(&snapshot.tax_lots_compressed)?;
                Ok(PositionState {
                    position_key: position_key.clone(),
                    account: trade.account.clone(),
                    instrument: trade.instrument.clone(),
                    currency: trade.currency.clone(),
                    version: snapshot.last_ver,
                    open_lots: lots,
                    price_quantity_schedule: snapshot.price_quantity_schedule.clone(),
                })
            }
            None => Ok(PositionState::empty(
                position_key.clone(),
                trade.account.clone(),
                trade.instrument.clone(),
                trade.currency.clone(),
            )),
        }
    }

    /// Applies `trade` to `state` (add or same-direction reduce, never an
    /// overflowing reduce — callers route those through the sign-change
    /// path first), appends the event, and upserts the snapshot.
    #[allow(clippy::too_many_arguments)]
    fn apply_and_persist(
        &self,
        state: &mut PositionState,
        trade: &TradeEvent,
        method: posledger_instrument::TaxLotMethod,
        existing_snapshot: Option<&SnapshotRecord>,
        event_type: EventType,
        reconciliation_status: ReconciliationStatus,
        provisional_trade_id: Option<String>,
        now: chrono::DateTime<Utc>,
        upi: &mut UpiRecorder,
    ) -> Result<SnapshotRecord, LedgerError> {
        let current_direction = Direction::from_signed_qty(state.total_qty());
        let same_direction_or_new = current_direction
            .map(|d| Direction::from_signed_qty(trade.quantity) == Some(d))
            .unwrap_or(true);

        let mut meta_lots = Vec::new();
        if same_direction_or_new {
            meta_lots.push(add_lot(
                state,
                trade.quantity,
                trade.price,
                trade.trade_date,
                trade.settlement_date,
            ));
        } else {
            let result = reduce_lots(state, trade.quantity.abs(), method, trade.price)?;
            meta_lots = result.allocations;
            // Non-overflowing by construction: callers branch to the
            // sign-change path before reaching here when it would overflow.
        }
        update_schedule(state, trade);

        let was_active = existing_snapshot
            .map(|s| s.status == PositionStatus::Active)
            .unwrap_or(false);
        let was_terminated = existing_snapshot
            .map(|s| s.status == PositionStatus::Terminated)
            .unwrap_or(false);
        let total_qty = state.total_qty();

        let (status, uti) = if was_active && total_qty.is_zero() {
            upi.record_terminated(
                state.position_key.clone(),
                existing_snapshot.map(|s| s.uti.clone()).unwrap_or_default(),
                trade.trade_id.clone(),
                trade.effective_date(),
                now,
            );
            (PositionStatus::Terminated, existing_snapshot.map(|s| s.uti.clone()).unwrap_or_default())
        } else if was_terminated && trade.trade_type == posledger_instrument::TradeType::NewTrade {
            let previous_upi = existing_snapshot.map(|s| s.uti.clone()).unwrap_or_default();
            upi.record_reopened(
                state.position_key.clone(),
                trade.trade_id.clone(),
                previous_upi,
                trade.trade_id.clone(),
                trade.effective_date(),
                now,
            );
            (PositionStatus::Active, trade.trade_id.clone())
        } else if existing_snapshot.is_none() {
            upi.record_created(
                state.position_key.clone(),
                trade.trade_id.clone(),
                trade.trade_id.clone(),
                trade.effective_date(),
                now,
            );
            (PositionStatus::Active, trade.trade_id.clone())
        } else {
            (
                existing_snapshot.map(|s| s.status).unwrap_or(PositionStatus::Active),
                existing_snapshot.map(|s| s.uti.clone()).unwrap_or_default(),
            )
        };

        let last_ver = self.append_idempotent(&state.position_key, &trade.trade_id, |event_ver| EventRecord {
            position_key: state.position_key.clone(),
            event_ver,
            event_type,
            effective_date: trade.effective_date(),
            occurred_at: now,
            payload: trade.clone(),
            meta_lots,
            correlation_id: trade.correlation_id.clone(),
            causation_id: trade.causation_id.clone(),
            contract_id: trade.contract_id.clone(),
        })?;

        let expected_version = existing_snapshot.map(|s| s.version).unwrap_or(0);
        let snapshot = build_snapshot_record(
            state,
            last_ver + 1,
            uti,
            status,
            reconciliation_status,
            provisional_trade_id,
            expected_version,
            now,
            rust_decimal::Decimal::ZERO,
        );
        self.snapshots.upsert(snapshot.clone(), expected_version)?;
        let mut persisted = snapshot;
        persisted.version = expected_version + 1;
        Ok(persisted)
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_sign_change_split(
        &self,
        state: &mut PositionState,
        trade: &TradeEvent,
        method: posledger_instrument::TaxLotMethod,
        existing_snapshot: Option<&SnapshotRecord>,
        current_direction: Direction,
        now: chrono::DateTime<Utc>,
        upi: &mut UpiRecorder,
    ) -> Result<(SnapshotRecord, SnapshotRecord), LedgerError> {
        let result = reduce_lots(state, trade.quantity.abs(), method, trade.price)?;
        update_schedule(state, trade);

        let old_uti = existing_snapshot.map(|s| s.uti.clone()).unwrap_or_default();
        upi.record_terminated(
            state.position_key.clone(),
            old_uti.clone(),
            trade.trade_id.clone(),
            trade.effective_date(),
            now,
        );

        let closing_ver = self.append_idempotent(&state.position_key, &trade.trade_id, |event_ver| EventRecord {
            position_key: state.position_key.clone(),
            event_ver,
            event_type: EventType::SignChangeClose,
            effective_date: trade.effective_date(),
            occurred_at: now,
            payload: trade.clone(),
            meta_lots: result.allocations,
            correlation_id: trade.correlation_id.clone(),
            causation_id: trade.causation_id.clone(),
            contract_id: trade.contract_id.clone(),
        })?;

        let closing_expected_version = existing_snapshot.map(|s| s.version).unwrap_or(0);
        let closed = build_snapshot_record(
            state,
            closing_ver + 1,
            old_uti,
            PositionStatus::Terminated,
            ReconciliationStatus::Reconciled,
            None,
            closing_expected_version,
            now,
            rust_decimal::Decimal::ZERO,
        );
        self.snapshots.upsert(closed.clone(), closing_expected_version)?;
        let mut closed_persisted = closed;
        closed_persisted.version = closing_expected_version + 1;

        let overflow_direction = current_direction.opposite();
        let overflow_magnitude = result.remaining_quantity.abs();
        let overflow_signed = match overflow_direction {
            Direction::Long => overflow_magnitude,
            Direction::Short => -overflow_magnitude,
        };

        let new_key = PositionKey::generate(&trade.account, &trade.instrument, &trade.currency, overflow_direction);
        let mut new_state = PositionState::empty(
            new_key.clone(),
            trade.account.clone(),
            trade.instrument.clone(),
            trade.currency.clone(),
        );
        add_lot(&mut new_state, overflow_signed, trade.price, trade.trade_date, trade.settlement_date);
        update_schedule(&mut new_state, trade);

        upi.record_created(new_key.clone(), trade.trade_id.clone(), trade.trade_id.clone(), trade.effective_date(), now);

        self.append_idempotent(&new_key, &trade.trade_id, |event_ver| EventRecord {
            position_key: new_key.clone(),
            event_ver,
            event_type: EventType::SignChangeOpen,
            effective_date: trade.effective_date(),
            occurred_at: now,
            payload: trade.clone(),
            meta_lots: vec![],
            correlation_id: trade.correlation_id.clone(),
            causation_id: trade.causation_id.clone(),
            contract_id: trade.contract_id.clone(),
        })?;

        let opened = build_snapshot_record(
            &new_state,
            1,
            trade.trade_id.clone(),
            PositionStatus::Active,
            ReconciliationStatus::Reconciled,
            None,
            0,
            now,
            rust_decimal::Decimal::ZERO,
        );
        self.snapshots.upsert(opened.clone(), 0)?;
        let mut opened_persisted = opened;
        opened_persisted.version = 1;

        Ok((closed_persisted, opened_persisted))
    }

    fn mark_processed(&self, trade: &TradeEvent, position_key: &PositionKey, error_message: Option<String>) {
        let status = if error_message.is_some() {
            IdempotencyStatus::Failed
        } else {
            IdempotencyStatus::Processed
        };
        if let Err(err) = self.idempotency.record(IdempotencyRecord {
            trade_id: trade.trade_id.clone(),
            position_key: position_key.clone(),
            event_version: 0,
            status,
            processed_at: Utc::now(),
            error_message,
        }) {
            warn!(trade_id = %trade.trade_id, %err, "idempotency record already present");
        }
    }
}
