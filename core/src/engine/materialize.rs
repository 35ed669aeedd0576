use chrono::{DateTime, NaiveDate, Utc};
use posledger_instrument::{
    PositionState, PositionStatus, ReconciliationStatus, ScheduleEntry, SnapshotRecord,
    SummaryMetrics, TradeEvent,
};

use crate::engine::snapshot_codec::compress;

/// Derives the persisted `summary_metrics` row from live position state
/// (spec §3 names the field without specifying its shape; resolved in
/// DESIGN.md).
pub fn summary_metrics(state: &PositionState, realized_pnl_lifetime: rust_decimal::Decimal) -> SummaryMetrics {
    SummaryMetrics {
        total_qty: state.total_qty(),
        exposure: state.exposure(),
        lot_count: state.lot_count(),
        realized_pnl_lifetime,
    }
}

/// Builds the snapshot row persisted after every hotpath/coldpath write
/// (spec §3, §4.6 step 8, §4.8 step 6).
#[allow(clippy::too_many_arguments)]
pub fn build_snapshot_record(
    state: &PositionState,
    last_ver: u64,
    uti: String,
    status: PositionStatus,
    reconciliation_status: ReconciliationStatus,
    provisional_trade_id: Option<String>,
    version: u64,
    now: DateTime<Utc>,
    realized_pnl_lifetime: rust_decimal::Decimal,
) -> SnapshotRecord {
    SnapshotRecord {
        position_key: state.position_key.clone(),
        last_ver,
        uti,
        status,
        reconciliation_status,
        provisional_trade_id,
        tax_lots_compressed: compress(&state.open_lots),
        summary_metrics: summary_metrics(state, realized_pnl_lifetime),
        price_quantity_schedule: state.price_quantity_schedule.clone(),
        version,
        last_updated_at: now,
    }
}

/// Maintains the append/update `price_quantity_schedule` map on `state` for
/// `trade`, keyed by `trade_date` (spec §3, §E6 supplement). The weighted
/// average price blends this trade into whatever was already recorded for
/// its `trade_date`.
pub fn update_schedule(state: &mut PositionState, trade: &TradeEvent) {
    let date: NaiveDate = trade.trade_date;
    let entry = state
        .price_quantity_schedule
        .entry(date)
        .or_insert(ScheduleEntry {
            settlement_date: trade.settlement_date,
            effective_qty: rust_decimal::Decimal::ZERO,
            settled_qty: rust_decimal::Decimal::ZERO,
            weighted_avg_price: trade.price,
        });

    let prior_qty = entry.effective_qty;
    let new_qty = prior_qty + trade.quantity;
    if !new_qty.is_zero() {
        entry.weighted_avg_price =
            (entry.weighted_avg_price * prior_qty + trade.price * trade.quantity) / new_qty;
    }
    entry.effective_qty = new_qty;
    if trade.settlement_date.is_some() {
        entry.settlement_date = trade.settlement_date;
        entry.settled_qty += trade.quantity;
    }
}
