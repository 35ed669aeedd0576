use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An open or closed acquisition cohort carrying its own cost basis and
/// remaining quantity (spec §3).
///
/// Invariants upheld by every constructor and mutator in this crate family:
/// `remaining_qty` has the same sign as `original_qty` or is zero, a lot is
/// closed iff `remaining_qty == 0`, and `|remaining_qty| <= |original_qty|`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaxLot {
    pub lot_id: Uuid,
    pub trade_date: NaiveDate,
    pub original_qty: Decimal,
    pub remaining_qty: Decimal,
    pub original_price: Decimal,
    pub current_ref_price: Decimal,
    pub settlement_date: Option<NaiveDate>,
    pub settled_quantity: Option<Decimal>,
}

impl TaxLot {
    pub fn new(
        trade_date: NaiveDate,
        qty: Decimal,
        price: Decimal,
        settlement_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            lot_id: Uuid::new_v4(),
            trade_date,
            original_qty: qty,
            remaining_qty: qty,
            original_price: price,
            current_ref_price: price,
            settlement_date,
            settled_quantity: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.remaining_qty.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.original_qty.is_sign_positive()
    }

    pub fn is_short(&self) -> bool {
        self.original_qty.is_sign_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_lot_is_fully_open() {
        let lot = TaxLot::new(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            dec!(100),
            dec!(50.00),
            None,
        );
        assert_eq!(lot.remaining_qty, lot.original_qty);
        assert!(!lot.is_closed());
        assert!(lot.is_long());
    }
}
