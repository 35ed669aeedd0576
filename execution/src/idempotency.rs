use std::collections::HashMap;

use parking_lot::RwLock;
use posledger_instrument::IdempotencyRecord;

use crate::error::StoreError;

/// At-most-once guard keyed by `trade_id` (spec §3, C5). A `trade_id` is
/// recorded exactly once, success or failure; the hotpath/coldpath appliers
/// check [`IdempotencyRegistry::lookup`] before doing any other work and
/// treat a hit as "already applied, return its recorded outcome".
pub trait IdempotencyRegistry: Send + Sync {
    fn lookup(&self, trade_id: &str) -> Option<IdempotencyRecord>;

    /// Records `record`. Fails if a record for this `trade_id` already
    /// exists — callers are expected to `lookup` first; this is the guard
    /// against a race between concurrent hotpath workers on the same trade.
    fn record(&self, record: IdempotencyRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryIdempotencyRegistry {
    rows: RwLock<HashMap<String, IdempotencyRecord>>,
}

impl InMemoryIdempotencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdempotencyRegistry for InMemoryIdempotencyRegistry {
    fn lookup(&self, trade_id: &str) -> Option<IdempotencyRecord> {
        let rows = self.rows.read();
        rows.get(trade_id).cloned()
    }

    fn record(&self, record: IdempotencyRecord) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        if rows.contains_key(&record.trade_id) {
            return Err(StoreError::DuplicateTradeId(record.trade_id));
        }
        rows.insert(record.trade_id.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use posledger_instrument::{Direction, IdempotencyStatus, PositionKey};

    fn record(trade_id: &str) -> IdempotencyRecord {
        IdempotencyRecord {
            trade_id: trade_id.into(),
            position_key: PositionKey::generate("acct", "aapl", "usd", Direction::Long),
            event_version: 0,
            status: IdempotencyStatus::Processed,
            processed_at: Utc::now(),
            error_message: None,
        }
    }

    #[test]
    fn rejects_duplicate_trade_id() {
        let registry = InMemoryIdempotencyRegistry::new();
        registry.record(record("t1")).unwrap();
        assert!(registry.lookup("t1").is_some());
        let err = registry.record(record("t1")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTradeId(_)));
    }
}
