use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{key::PositionKey, types::{PositionStatus, UpiChangeType}};

/// Append-only audit record of a position-identity lifecycle transition
/// (spec §3, §4.6, §4.8).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpiHistoryRecord {
    pub position_key: PositionKey,
    pub upi: String,
    pub previous_upi: Option<String>,
    pub status: PositionStatus,
    pub previous_status: Option<PositionStatus>,
    pub change_type: UpiChangeType,
    pub triggering_trade_id: String,
    pub backdated_trade_id: Option<String>,
    pub effective_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
    pub merged_from_position_key: Option<PositionKey>,
    pub reason: Option<String>,
}
