use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Side of a position, derived from the sign of its net quantity.
///
/// A direction flip on an existing position always produces a distinct
/// [`PositionKey`](crate::key::PositionKey) — see spec §4.1.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Direction implied by the sign of a signed quantity. Zero has no direction.
    pub fn from_signed_qty(qty: rust_decimal::Decimal) -> Option<Self> {
        if qty.is_sign_positive() && !qty.is_zero() {
            Some(Self::Long)
        } else if qty.is_sign_negative() {
            Some(Self::Short)
        } else {
            None
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    /// Uppercase wire representation used by the position key hash input.
    pub fn as_key_str(self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
        }
    }
}

/// Inbound trade classification, as carried on [`TradeEvent`](crate::trade::TradeEvent).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum TradeType {
    NewTrade,
    Increase,
    Decrease,
}

/// Tax-lot consumption ordering, resolved per-contract via the contract-rules
/// collaborator, defaulting to FIFO (spec §4.6, §9).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Default, Deserialize, Serialize,
)]
pub enum TaxLotMethod {
    #[default]
    Fifo,
    Lifo,
    Hifo,
}

/// Output of the classifier (C6): where a trade is routed.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum Classification {
    CurrentDated,
    ForwardDated,
    Backdated,
}

/// Whether a snapshot is authoritative or awaiting coldpath override.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum ReconciliationStatus {
    Reconciled,
    Provisional,
}

/// Lifecycle status of a position episode.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum PositionStatus {
    Active,
    Terminated,
}

/// Reason a [`UpiHistoryRecord`](crate::upi::UpiHistoryRecord) was appended.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum UpiChangeType {
    Created,
    Terminated,
    Reopened,
    Invalidated,
    Restored,
    Merged,
}

/// Outcome recorded against an [`IdempotencyRecord`](crate::idempotency::IdempotencyRecord).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum IdempotencyStatus {
    Processed,
    Failed,
}

/// Kind of [`EventRecord`](crate::event::EventRecord) appended to a position's stream.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
pub enum EventType {
    /// Hotpath-applied trade against the current (pre-existing) position identity.
    Applied,
    /// Hotpath-applied backdated trade, stamped provisional pending coldpath override.
    Provisional,
    /// Coldpath-injected historical event, replayed chronologically.
    HistoricalCorrection,
    /// Closing leg of a sign-change split (spec §4.6).
    SignChangeClose,
    /// Opening leg of a sign-change split on the newly created position key.
    SignChangeOpen,
}
