use posledger_instrument::PositionKey;
use thiserror::Error;

/// Storage-layer failures (spec §4.4/§4.5/§4.8/§4.9). `VersionConflict` is
/// the optimistic-concurrency signal the hotpath/coldpath appliers retry on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("expected version {expected} for {position_key}, found {found}")]
    VersionConflict {
        position_key: PositionKey,
        expected: u64,
        found: u64,
    },
    #[error("no snapshot found for {0}")]
    SnapshotNotFound(PositionKey),
    #[error("event {event_ver} already exists for {position_key}")]
    DuplicateEvent {
        position_key: PositionKey,
        event_ver: u64,
    },
    #[error("idempotency record for trade_id {0} already exists")]
    DuplicateTradeId(String),
}
