use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{key::PositionKey, trade::TradeEvent, types::EventType};

/// One allocation leg produced by the tax-lot engine against a single lot
/// (spec §4.2): an add, or the closed portion of a reduce.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LotAllocation {
    pub lot_id: Uuid,
    pub closed_qty: Decimal,
    pub price: Decimal,
    pub realized_pnl: Option<Decimal>,
}

/// Immutable append-only record keyed by `(position_key, event_ver)` (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventRecord {
    pub position_key: PositionKey,
    pub event_ver: u64,
    pub event_type: EventType,
    pub effective_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
    pub payload: TradeEvent,
    pub meta_lots: Vec<LotAllocation>,
    pub correlation_id: Option<String>,
    pub causation_id: Option<String>,
    pub contract_id: Option<String>,
}
