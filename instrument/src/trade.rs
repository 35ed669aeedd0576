use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{key::PositionKey, types::TradeType};

/// Immutable inbound trade message (spec §3). `trade_id` is the idempotency
/// key; at most one event in the whole system is ever created per `trade_id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TradeEvent {
    pub trade_id: String,
    #[serde(default)]
    pub position_key: Option<PositionKey>,
    pub account: String,
    pub instrument: String,
    pub currency: String,
    pub trade_type: TradeType,
    pub quantity: Decimal,
    pub price: Decimal,
    pub trade_date: NaiveDate,
    #[serde(default)]
    pub settlement_date: Option<NaiveDate>,
    #[serde(default)]
    effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub causation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TradeEvent {
    /// Builds a trade with all optional fields unset. `effective_date` is
    /// private so every caller, in every crate, goes through
    /// [`TradeEvent::effective_date`] rather than risking a bypass of the
    /// "defaults to `trade_date`" rule.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: String,
        account: String,
        instrument: String,
        currency: String,
        trade_type: TradeType,
        quantity: Decimal,
        price: Decimal,
        trade_date: NaiveDate,
    ) -> Self {
        Self {
            trade_id,
            position_key: None,
            account,
            instrument,
            currency,
            trade_type,
            quantity,
            price,
            trade_date,
            settlement_date: None,
            effective_date: None,
            contract_id: None,
            correlation_id: None,
            causation_id: None,
            user_id: None,
        }
    }

    /// Overrides `effective_date` explicitly (spec §3: backdated trades).
    pub fn with_effective_date(mut self, effective_date: NaiveDate) -> Self {
        self.effective_date = Some(effective_date);
        self
    }

    /// `effective_date` defaults to `trade_date` when absent (spec §3).
    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date.unwrap_or(self.trade_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_date_defaults_to_trade_date() {
        let trade = TradeEvent {
            trade_id: "t1".into(),
            position_key: None,
            account: "acct".into(),
            instrument: "AAPL".into(),
            currency: "USD".into(),
            trade_type: TradeType::NewTrade,
            quantity: Decimal::from(100),
            price: Decimal::from(50),
            trade_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            settlement_date: None,
            effective_date: None,
            contract_id: None,
            correlation_id: None,
            causation_id: None,
            user_id: None,
        };
        assert_eq!(trade.effective_date(), trade.trade_date);
    }
}
