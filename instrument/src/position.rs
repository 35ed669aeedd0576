use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{key::PositionKey, lot::TaxLot};

/// Append/update entry of a position's `price_quantity_schedule`, keyed by
/// `trade_date` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ScheduleEntry {
    pub settlement_date: Option<NaiveDate>,
    pub effective_qty: Decimal,
    pub settled_qty: Decimal,
    pub weighted_avg_price: Decimal,
}

/// In-memory materialized state of a single position episode (spec §3).
///
/// `open_lots` includes closed lots until the next snapshot upsert prunes
/// them; `total_qty`, `exposure`, and `lot_count` are always derived, never
/// stored redundantly on this type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionState {
    pub position_key: PositionKey,
    pub account: String,
    pub instrument: String,
    pub currency: String,
    pub version: u64,
    pub open_lots: Vec<TaxLot>,
    pub price_quantity_schedule: BTreeMap<NaiveDate, ScheduleEntry>,
}

impl PositionState {
    pub fn empty(position_key: PositionKey, account: String, instrument: String, currency: String) -> Self {
        Self {
            position_key,
            account,
            instrument,
            currency,
            version: 0,
            open_lots: Vec::new(),
            price_quantity_schedule: BTreeMap::new(),
        }
    }

    /// `Σ remaining_qty` across all lots, open or not-yet-pruned-closed.
    pub fn total_qty(&self) -> Decimal {
        self.open_lots.iter().map(|lot| lot.remaining_qty).sum()
    }

    /// `Σ remaining_qty × current_ref_price`.
    pub fn exposure(&self) -> Decimal {
        self.open_lots
            .iter()
            .map(|lot| lot.remaining_qty * lot.current_ref_price)
            .sum()
    }

    /// Count of lots with non-zero `remaining_qty`.
    pub fn lot_count(&self) -> usize {
        self.open_lots
            .iter()
            .filter(|lot| !lot.remaining_qty.is_zero())
            .count()
    }

    /// Max `trade_date` across open (non-zero) lots — the "snapshot date"
    /// used by the classifier (spec §4.5). `None` when the position is flat.
    pub fn latest_open_trade_date(&self) -> Option<NaiveDate> {
        self.open_lots
            .iter()
            .filter(|lot| !lot.remaining_qty.is_zero())
            .map(|lot| lot.trade_date)
            .max()
    }

    /// Prune lots with `remaining_qty == 0`, as done on every snapshot upsert
    /// (spec §3: "closed lots are pruned on snapshot upsert").
    pub fn prune_closed_lots(&mut self) {
        self.open_lots.retain(|lot| !lot.is_closed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lot::TaxLot;
    use rust_decimal_macros::dec;

    fn key() -> PositionKey {
        PositionKey::generate("acct", "aapl", "usd", crate::types::Direction::Long)
    }

    #[test]
    fn derived_totals_sum_open_lots() {
        let mut state = PositionState::empty(key(), "acct".into(), "aapl".into(), "usd".into());
        state.open_lots.push(TaxLot::new(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            dec!(100),
            dec!(50),
            None,
        ));
        state.open_lots.push(TaxLot::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            dec!(50),
            dec!(55),
            None,
        ));
        assert_eq!(state.total_qty(), dec!(150));
        assert_eq!(state.lot_count(), 2);
    }

    #[test]
    fn prune_removes_only_closed_lots() {
        let mut state = PositionState::empty(key(), "acct".into(), "aapl".into(), "usd".into());
        let mut closed = TaxLot::new(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            dec!(100),
            dec!(50),
            None,
        );
        closed.remaining_qty = dec!(0);
        state.open_lots.push(closed);
        state.open_lots.push(TaxLot::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            dec!(30),
            dec!(55),
            None,
        ));
        state.prune_closed_lots();
        assert_eq!(state.open_lots.len(), 1);
    }
}
