use chrono::NaiveDate;
use posledger_instrument::{LotAllocation, PositionState, TaxLot, TaxLotMethod};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures from the pure tax-lot primitives (spec §4.2, C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("qty_to_reduce must be positive")]
    InvalidArgument,
    #[error("no open lots to reduce")]
    NoOpenLots,
}

/// Result of a `reduce_lots` call. `remaining_quantity` is zero when the
/// reduction was fully absorbed by same-direction lots; it is negative —
/// the magnitude still to be closed — when the request overflowed past the
/// available same-direction quantity. The hotpath applier reads a non-zero
/// `remaining_quantity` as the signal to perform a sign-change split
/// (spec §4.2, §4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    pub allocations: Vec<LotAllocation>,
    pub remaining_quantity: Decimal,
}

impl AllocationResult {
    pub fn overflowed(&self) -> bool {
        !self.remaining_quantity.is_zero()
    }
}

/// Opens a new lot on `state` for `qty` (sign preserved) at `price`, dated
/// `trade_date`. Returns the single-entry allocation for the append event.
pub fn add_lot(
    state: &mut PositionState,
    qty: Decimal,
    price: Decimal,
    trade_date: NaiveDate,
    settlement_date: Option<NaiveDate>,
) -> LotAllocation {
    let lot = TaxLot::new(trade_date, qty, price, settlement_date);
    let allocation = LotAllocation {
        lot_id: lot.lot_id,
        closed_qty: qty,
        price,
        realized_pnl: None,
    };
    state.open_lots.push(lot);
    allocation
}

/// Consumes `qty_to_reduce` (a positive magnitude) from `state`'s open lots
/// in the order prescribed by `method`, realizing P&L against `close_price`
/// (spec §4.2).
pub fn reduce_lots(
    state: &mut PositionState,
    qty_to_reduce: Decimal,
    method: TaxLotMethod,
    close_price: Decimal,
) -> Result<AllocationResult, EngineError> {
    if qty_to_reduce <= Decimal::ZERO {
        return Err(EngineError::InvalidArgument);
    }

    let mut order: Vec<usize> = state
        .open_lots
        .iter()
        .enumerate()
        .filter(|(_, lot)| !lot.remaining_qty.is_zero())
        .map(|(i, _)| i)
        .collect();

    if order.is_empty() {
        return Err(EngineError::NoOpenLots);
    }

    sort_lot_indices(&mut order, &state.open_lots, method);

    let mut remaining = qty_to_reduce;
    let mut allocations = Vec::new();

    for idx in order {
        if remaining.is_zero() {
            break;
        }
        let lot = &mut state.open_lots[idx];
        let available = lot.remaining_qty.abs();
        let closed_qty = remaining.min(available);
        if closed_qty.is_zero() {
            continue;
        }

        let is_long = lot.remaining_qty.is_sign_positive();
        let realized_pnl = if is_long {
            (close_price - lot.original_price) * closed_qty
        } else {
            (lot.original_price - close_price) * closed_qty
        };

        if is_long {
            lot.remaining_qty -= closed_qty;
        } else {
            lot.remaining_qty += closed_qty;
        }

        allocations.push(LotAllocation {
            lot_id: lot.lot_id,
            closed_qty,
            price: close_price,
            realized_pnl: Some(realized_pnl),
        });

        remaining -= closed_qty;
    }

    state.prune_closed_lots();

    Ok(AllocationResult {
        allocations,
        remaining_quantity: if remaining.is_zero() { Decimal::ZERO } else { -remaining },
    })
}

fn sort_lot_indices(order: &mut [usize], lots: &[TaxLot], method: TaxLotMethod) {
    match method {
        TaxLotMethod::Fifo => {
            order.sort_by(|&a, &b| {
                lots[a]
                    .trade_date
                    .cmp(&lots[b].trade_date)
                    .then_with(|| lots[a].lot_id.cmp(&lots[b].lot_id))
            });
        }
        TaxLotMethod::Lifo => {
            order.sort_by(|&a, &b| {
                lots[b]
                    .trade_date
                    .cmp(&lots[a].trade_date)
                    .then_with(|| lots[a].lot_id.cmp(&lots[b].lot_id))
            });
        }
        TaxLotMethod::Hifo => {
            order.sort_by(|&a, &b| {
                lots[b]
                    .current_ref_price
                    .cmp(&lots[a].current_ref_price)
                    .then_with(|| lots[a].trade_date.cmp(&lots[b].trade_date))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posledger_instrument::{Direction, PositionKey};
    use rust_decimal_macros::dec;

    fn state() -> PositionState {
        PositionState::empty(
            PositionKey::generate("acct", "aapl", "usd", Direction::Long),
            "acct".into(),
            "aapl".into(),
            "usd".into(),
        )
    }

    #[test]
    fn add_lot_preserves_sign_and_sets_current_ref_price() {
        let mut s = state();
        let alloc = add_lot(
            &mut s,
            dec!(100),
            dec!(50),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            None,
        );
        assert_eq!(alloc.closed_qty, dec!(100));
        assert_eq!(s.open_lots[0].current_ref_price, dec!(50));
        assert_eq!(s.total_qty(), dec!(100));
    }

    #[test]
    fn fifo_closes_oldest_lot_first_and_realizes_pnl() {
        let mut s = state();
        add_lot(&mut s, dec!(100), dec!(50), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(), None);
        add_lot(&mut s, dec!(50), dec!(55), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), None);

        let result = reduce_lots(&mut s, dec!(120), TaxLotMethod::Fifo, dec!(60)).unwrap();
        assert!(!result.overflowed());
        assert_eq!(result.allocations[0].closed_qty, dec!(100));
        assert_eq!(result.allocations[0].realized_pnl, Some(dec!(1000)));
        assert_eq!(result.allocations[1].closed_qty, dec!(20));
        assert_eq!(s.total_qty(), dec!(30));
    }

    #[test]
    fn overflow_reduction_reports_negated_remaining_quantity() {
        let mut s = state();
        add_lot(&mut s, dec!(30), dec!(55), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), None);

        let result = reduce_lots(&mut s, dec!(50), TaxLotMethod::Fifo, dec!(58)).unwrap();
        assert!(result.overflowed());
        assert_eq!(result.remaining_quantity, dec!(-20));
        assert_eq!(s.total_qty(), dec!(0));
    }

    #[test]
    fn hifo_closes_highest_cost_lot_first() {
        let mut s = state();
        add_lot(&mut s, dec!(50), dec!(40), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(), None);
        add_lot(&mut s, dec!(50), dec!(60), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), None);

        let result = reduce_lots(&mut s, dec!(50), TaxLotMethod::Hifo, dec!(65)).unwrap();
        assert_eq!(result.allocations[0].price, dec!(65));
        assert_eq!(s.open_lots.len(), 1);
        assert_eq!(s.open_lots[0].original_price, dec!(40));
    }

    #[test]
    fn short_lot_close_inverts_pnl_formula() {
        let mut s = state();
        add_lot(&mut s, dec!(-100), dec!(50), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(), None);

        let result = reduce_lots(&mut s, dec!(100), TaxLotMethod::Fifo, dec!(40)).unwrap();
        assert_eq!(result.allocations[0].realized_pnl, Some(dec!(1000)));
        assert_eq!(s.total_qty(), dec!(0));
    }

    #[test]
    fn rejects_non_positive_reduce_quantity() {
        let mut s = state();
        add_lot(&mut s, dec!(10), dec!(50), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(), None);
        assert_eq!(
            reduce_lots(&mut s, dec!(0), TaxLotMethod::Fifo, dec!(50)),
            Err(EngineError::InvalidArgument)
        );
    }

    #[test]
    fn rejects_reduce_with_no_open_lots() {
        let mut s = state();
        assert_eq!(
            reduce_lots(&mut s, dec!(10), TaxLotMethod::Fifo, dec!(50)),
            Err(EngineError::NoOpenLots)
        );
    }
}
