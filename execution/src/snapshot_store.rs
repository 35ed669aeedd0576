use std::collections::HashMap;

use parking_lot::RwLock;
use posledger_instrument::{PositionKey, SnapshotRecord};

use crate::error::StoreError;

/// One row per `position_key`, overwritten in place under optimistic
/// concurrency control (spec §3, §4.4, C3). `upsert` is a compare-and-swap
/// on [`SnapshotRecord::version`]: callers read-modify-write and the store
/// rejects a write whose expected version has moved on.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, position_key: &PositionKey) -> Option<SnapshotRecord>;

    /// Inserts `snapshot` if no row exists yet, or replaces the existing row
    /// when `expected_version` matches its current `version`. On success the
    /// stored row's `version` is `expected_version + 1`.
    fn upsert(&self, snapshot: SnapshotRecord, expected_version: u64) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    rows: RwLock<HashMap<PositionKey, SnapshotRecord>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self, position_key: &PositionKey) -> Option<SnapshotRecord> {
        let rows = self.rows.read();
        rows.get(position_key).cloned()
    }

    fn upsert(&self, mut snapshot: SnapshotRecord, expected_version: u64) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        match rows.get(&snapshot.position_key) {
            Some(existing) if existing.version != expected_version => {
                return Err(StoreError::VersionConflict {
                    position_key: snapshot.position_key.clone(),
                    expected: expected_version,
                    found: existing.version,
                });
            }
            Some(_) | None => {}
        }
        snapshot.version = expected_version + 1;
        rows.insert(snapshot.position_key.clone(), snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use posledger_instrument::{
        CompressedLots, Direction, PositionStatus, ReconciliationStatus, SummaryMetrics,
    };
    use std::collections::BTreeMap;

    fn snapshot(position_key: PositionKey, version: u64) -> SnapshotRecord {
        SnapshotRecord {
            position_key,
            last_ver: 0,
            uti: "UTI1".into(),
            status: PositionStatus::Active,
            reconciliation_status: ReconciliationStatus::Reconciled,
            provisional_trade_id: None,
            tax_lots_compressed: CompressedLots::default(),
            summary_metrics: SummaryMetrics::default(),
            price_quantity_schedule: BTreeMap::new(),
            version,
            last_updated_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_upsert_on_stale_expected_version() {
        let store = InMemorySnapshotStore::new();
        let key = PositionKey::generate("acct", "aapl", "usd", Direction::Long);
        store.upsert(snapshot(key.clone(), 0), 0).unwrap();
        assert_eq!(store.load(&key).unwrap().version, 1);

        let err = store.upsert(snapshot(key.clone(), 0), 0).unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        store.upsert(snapshot(key.clone(), 0), 1).unwrap();
        assert_eq!(store.load(&key).unwrap().version, 2);
    }
}
