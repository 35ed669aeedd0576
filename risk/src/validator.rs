use chrono::{Datelike, NaiveDate};
use posledger_instrument::{Direction, PositionState, TradeEvent};
use rust_decimal::Decimal;
use thiserror::Error;

/// One failed field/bound check (spec §4.7, C7). Hotpath collects every
/// failure of a trade into a `Vec<ValidationError>` before publishing to the
/// DLQ with reasons — a single validation pass never stops at the first
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("trade_id must not be empty")]
    MissingTradeId,
    #[error("account must not be empty")]
    MissingAccount,
    #[error("instrument must not be empty")]
    MissingInstrument,
    #[error("currency must not be empty")]
    MissingCurrency,
    #[error("quantity must be non-zero")]
    ZeroQuantity,
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),
    #[error("price {0} exceeds max_price {1}")]
    PriceExceedsMax(Decimal, Decimal),
    #[error("{field} {date} exceeds today + {max_future_years}y")]
    DateTooFarInFuture {
        field: &'static str,
        date: NaiveDate,
        max_future_years: i32,
    },
    #[error(
        "same-direction decrease of {requested} exceeds available magnitude {available} \
         and sign-change split is disabled"
    )]
    DecreaseExceedsAvailable {
        requested: Decimal,
        available: Decimal,
    },
}

/// Field/bound validator (C7). `max_price`, `max_future_years`, `today` are
/// supplied by the caller so the check stays pure and independently
/// testable (spec §6 names `validator.max_price` = 1,000,000 and
/// `validator.max_future_years` = 1 as configuration).
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    pub max_price: Decimal,
    pub max_future_years: i32,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            max_price: Decimal::from(1_000_000),
            max_future_years: 1,
        }
    }
}

impl Validator {
    /// Field/bound checks that do not require current position state.
    pub fn validate_fields(&self, trade: &TradeEvent, today: NaiveDate) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if trade.trade_id.trim().is_empty() {
            errors.push(ValidationError::MissingTradeId);
        }
        if trade.account.trim().is_empty() {
            errors.push(ValidationError::MissingAccount);
        }
        if trade.instrument.trim().is_empty() {
            errors.push(ValidationError::MissingInstrument);
        }
        if trade.currency.trim().is_empty() {
            errors.push(ValidationError::MissingCurrency);
        }
        if trade.quantity.is_zero() {
            errors.push(ValidationError::ZeroQuantity);
        }
        if trade.price <= Decimal::ZERO {
            errors.push(ValidationError::NonPositivePrice(trade.price));
        } else if trade.price > self.max_price {
            errors.push(ValidationError::PriceExceedsMax(trade.price, self.max_price));
        }

        let cutoff = add_years(today, self.max_future_years);
        if trade.trade_date > cutoff {
            errors.push(ValidationError::DateTooFarInFuture {
                field: "trade_date",
                date: trade.trade_date,
                max_future_years: self.max_future_years,
            });
        }
        if trade.effective_date() > cutoff {
            errors.push(ValidationError::DateTooFarInFuture {
                field: "effective_date",
                date: trade.effective_date(),
                max_future_years: self.max_future_years,
            });
        }

        errors
    }

    /// Checks that depend on the current position state (spec §4.7): a
    /// same-direction decrease cannot exceed available magnitude unless the
    /// caller permits a sign-change split (the default).
    pub fn validate_against_state(
        &self,
        trade: &TradeEvent,
        state: &PositionState,
        current_direction: Option<Direction>,
        allow_sign_change: bool,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if allow_sign_change {
            return errors;
        }

        let Some(direction) = current_direction else {
            return errors;
        };

        let is_same_direction_decrease = match direction {
            Direction::Long => trade.quantity.is_sign_negative(),
            Direction::Short => trade.quantity.is_sign_positive(),
        };

        if is_same_direction_decrease {
            let available = state.total_qty().abs();
            let requested = trade.quantity.abs();
            if requested > available {
                errors.push(ValidationError::DecreaseExceedsAvailable {
                    requested,
                    available,
                });
            }
        }

        errors
    }
}

fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    date.with_year(date.year() + years).unwrap_or(date)
}
