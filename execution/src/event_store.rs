use std::collections::HashMap;

use parking_lot::RwLock;
use posledger_instrument::{EventRecord, PositionKey};

use crate::error::StoreError;

/// Append-only log keyed by `(position_key, event_ver)` (spec §3, §4.4, C4).
/// `event_ver` is a dense, per-position sequence assigned by
/// [`EventStore::next_version`]; appending anything other than the current
/// next-free version is a [`StoreError::VersionConflict`], which is the
/// signal callers retry on (spec §5 hotpath, §9 coldpath backoff policies).
pub trait EventStore: Send + Sync {
    /// The version the next appended event for `position_key` must carry.
    fn next_version(&self, position_key: &PositionKey) -> u64;

    /// Appends `record`. Fails if `record.event_ver` is not exactly
    /// `next_version(&record.position_key)` at the moment of the call.
    fn append(&self, record: EventRecord) -> Result<(), StoreError>;

    /// All events for a position, ascending by `event_ver`. Used by the
    /// coldpath recalculator to rebuild a position episode from scratch
    /// (spec §4.9).
    fn load_all(&self, position_key: &PositionKey) -> Vec<EventRecord>;

    /// Events strictly after `after_ver`, ascending. Used for incremental
    /// catch-up once a snapshot already covers earlier versions.
    fn load_since(&self, position_key: &PositionKey, after_ver: u64) -> Vec<EventRecord>;
}

/// Reference in-process implementation. Production deployments back this
/// trait with a durable, partitioned log (spec §6 names the transport, not
/// the storage engine); this implementation is what the test suite and the
/// worker pool wiring exercise against.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<PositionKey, Vec<EventRecord>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn next_version(&self, position_key: &PositionKey) -> u64 {
        let events = self.events.read();
        events
            .get(position_key)
            .map(|log| log.len() as u64)
            .unwrap_or(0)
    }

    fn append(&self, record: EventRecord) -> Result<(), StoreError> {
        let mut events = self.events.write();
        let log = events.entry(record.position_key.clone()).or_default();
        let expected = log.len() as u64;
        if record.event_ver != expected {
            return Err(StoreError::VersionConflict {
                position_key: record.position_key.clone(),
                expected,
                found: record.event_ver,
            });
        }
        log.push(record);
        Ok(())
    }

    fn load_all(&self, position_key: &PositionKey) -> Vec<EventRecord> {
        let events = self.events.read();
        events.get(position_key).cloned().unwrap_or_default()
    }

    fn load_since(&self, position_key: &PositionKey, after_ver: u64) -> Vec<EventRecord> {
        self.load_all(position_key)
            .into_iter()
            .filter(|e| e.event_ver > after_ver)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use posledger_instrument::{Direction, EventType, TradeEvent, TradeType};
    use rust_decimal_macros::dec;

    fn record(position_key: PositionKey, event_ver: u64) -> EventRecord {
        EventRecord {
            position_key,
            event_ver,
            event_type: EventType::Applied,
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            occurred_at: Utc::now(),
            payload: TradeEvent::new(
                "t1".into(),
                "acct".into(),
                "AAPL".into(),
                "USD".into(),
                TradeType::NewTrade,
                dec!(10),
                dec!(100),
                NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            ),
            meta_lots: Vec::new(),
            correlation_id: None,
            causation_id: None,
            contract_id: None,
        }
    }

    #[test]
    fn appends_sequentially_and_rejects_gaps() {
        let store = InMemoryEventStore::new();
        let key = PositionKey::generate("acct", "aapl", "usd", Direction::Long);
        assert_eq!(store.next_version(&key), 0);
        store.append(record(key.clone(), 0)).unwrap();
        assert_eq!(store.next_version(&key), 1);
        let err = store.append(record(key.clone(), 5)).unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
        store.append(record(key.clone(), 1)).unwrap();
        assert_eq!(store.load_all(&key).len(), 2);
        assert_eq!(store.load_since(&key, 0).len(), 1);
    }
}
