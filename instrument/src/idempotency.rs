use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{key::PositionKey, types::IdempotencyStatus};

/// At-most-once guard row keyed by `trade_id` (spec §3, C5).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IdempotencyRecord {
    pub trade_id: String,
    pub position_key: PositionKey,
    pub event_version: u64,
    pub status: IdempotencyStatus,
    pub processed_at: DateTime<Utc>,
    pub error_message: Option<String>,
}
