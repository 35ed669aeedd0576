use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    key::PositionKey,
    position::ScheduleEntry,
    types::{PositionStatus, ReconciliationStatus},
};

/// Columnar (compressed) representation of `PositionState::open_lots` (spec
/// §4.3, C3). Arrays are parallel and equal length; a row is closed iff
/// `qtys[i] == 0`. Unknown top-level fields on the surrounding
/// [`SnapshotRecord`] are tolerated on read for forward compatibility.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CompressedLots {
    pub ids: Vec<Uuid>,
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<Decimal>,
    pub qtys: Vec<Decimal>,
    pub original_prices: Vec<Decimal>,
    pub original_qtys: Vec<Decimal>,
}

impl CompressedLots {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Derived position metrics persisted on every snapshot upsert (spec §3
/// names `summary_metrics` without specifying its shape; resolved here, see
/// DESIGN.md).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct SummaryMetrics {
    pub total_qty: Decimal,
    pub exposure: Decimal,
    pub lot_count: usize,
    pub realized_pnl_lifetime: Decimal,
}

/// One row per `position_key`, overwritten in place (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SnapshotRecord {
    pub position_key: PositionKey,
    pub last_ver: u64,
    pub uti: String,
    pub status: PositionStatus,
    pub reconciliation_status: ReconciliationStatus,
    pub provisional_trade_id: Option<String>,
    pub tax_lots_compressed: CompressedLots,
    pub summary_metrics: SummaryMetrics,
    pub price_quantity_schedule: BTreeMap<NaiveDate, ScheduleEntry>,
    /// Optimistic lock counter, independent of `last_ver`.
    pub version: u64,
    pub last_updated_at: DateTime<Utc>,
}
