#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # posledger-instrument
//!
//! Position, tax-lot, trade, and audit data structures for the `posledger`
//! event-sourced position and tax-lot engine. This crate carries no
//! business logic — [`posledger-core`](../posledger_core/index.html) owns
//! the classifier, tax-lot engine, snapshot codec, and hotpath/coldpath
//! appliers that operate on these types.

pub mod event;
pub mod idempotency;
pub mod key;
pub mod lot;
pub mod position;
pub mod snapshot;
pub mod trade;
pub mod types;
pub mod upi;

pub use event::{EventRecord, LotAllocation};
pub use idempotency::IdempotencyRecord;
pub use key::PositionKey;
pub use lot::TaxLot;
pub use position::{PositionState, ScheduleEntry};
pub use snapshot::{CompressedLots, SnapshotRecord, SummaryMetrics};
pub use trade::TradeEvent;
pub use types::{
    Classification, Direction, EventType, IdempotencyStatus, PositionStatus,
    ReconciliationStatus, TaxLotMethod, TradeType, UpiChangeType,
};
pub use upi::UpiHistoryRecord;
