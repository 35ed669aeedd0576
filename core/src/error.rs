//! Central error type for the posledger engine (spec §7).
//!
//! Aggregates the validation, tax-lot, codec, and storage failure kinds
//! into one enum so hotpath/coldpath callers can match on retryability in
//! one place rather than threading each subsystem's error type by hand.

use posledger_execution::StoreError;
use posledger_risk::ValidationError;
use thiserror::Error;

use crate::engine::tax_lot::EngineError;
use crate::engine::snapshot_codec::CodecError;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Surfaced to the DLQ; never retried.
    #[error("validation failed: {0:?}")]
    Validation(Vec<ValidationError>),

    /// Idempotency hit on an already-PROCESSED trade_id; callers should
    /// return the cached state rather than treat this as a failure.
    #[error("trade_id {0} already processed")]
    DuplicateTrade(String),

    /// Event-append key conflict or snapshot optimistic conflict. Retried
    /// internally with backoff; surfaced only after attempts are exhausted.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(#[from] StoreError),

    /// Tax-lot engine failure: bad argument, or reduce with no open lots
    /// outside a sign-change context.
    #[error("tax-lot engine error: {0}")]
    TaxLotEngine(#[from] EngineError),

    #[error("snapshot codec failure: {0}")]
    Serialization(#[from] CodecError),

    /// Retry budget exhausted on a concurrency conflict.
    #[error("system unavailable after exhausting retries for {position_key}")]
    SystemUnavailable { position_key: String },

    /// e.g. a snapshot reporting zero open lots but non-zero total_qty.
    #[error("data invariant violated: {0}")]
    DataInvariantViolation(String),
}

impl LedgerError {
    /// Whether an internal retry loop (spec §4.6/§4.8 backoff policies)
    /// should catch and retry this error rather than propagate it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrencyConflict(_))
    }
}
