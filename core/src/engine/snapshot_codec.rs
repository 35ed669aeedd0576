use posledger_instrument::{CompressedLots, TaxLot};
use thiserror::Error;

/// Snapshot (de)compression failures (spec §4.3, C3). Only raised for a
/// non-empty, structurally inconsistent snapshot — an empty/blank snapshot
/// always inflates to an empty lot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("compressed lot arrays have mismatched lengths")]
    RaggedArrays,
}

/// Compresses an open-lot list into the columnar form persisted on a
/// snapshot row (spec §4.3).
pub fn compress(lots: &[TaxLot]) -> CompressedLots {
    let mut out = CompressedLots::default();
    for lot in lots {
        out.ids.push(lot.lot_id);
        out.dates.push(lot.trade_date);
        out.prices.push(lot.current_ref_price);
        out.qtys.push(lot.remaining_qty);
        out.original_prices.push(lot.original_price);
        out.original_qtys.push(lot.original_qty);
    }
    out
}

/// Reconstructs lots from a compressed record, row by row. A row is closed
/// iff `qtys[i] == 0`. An empty (or all-default) record inflates to an
/// empty list rather than an error.
pub fn inflate(compressed: &CompressedLots) -> Result<Vec<TaxLot>, CodecError> {
    if compressed.is_empty() {
        return Ok(Vec::new());
    }

    let n = compressed.ids.len();
    if compressed.dates.len() != n
        || compressed.prices.len() != n
        || compressed.qtys.len() != n
        || compressed.original_prices.len() != n
        || compressed.original_qtys.len() != n
    {
        return Err(CodecError::RaggedArrays);
    }

    Ok((0..n)
        .map(|i| TaxLot {
            lot_id: compressed.ids[i],
            trade_date: compressed.dates[i],
            original_qty: compressed.original_qtys[i],
            remaining_qty: compressed.qtys[i],
            original_price: compressed.original_prices[i],
            current_ref_price: compressed.prices[i],
            settlement_date: None,
            settled_quantity: None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn round_trips_a_lot_sequence() {
        let lots = vec![
            TaxLot::new(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(), dec!(100), dec!(50), None),
            TaxLot::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), dec!(-30), dec!(60), None),
        ];
        let compressed = compress(&lots);
        let inflated = inflate(&compressed).unwrap();
        assert_eq!(inflated.len(), lots.len());
        for (original, back) in lots.iter().zip(inflated.iter()) {
            assert_eq!(original.lot_id, back.lot_id);
            assert_eq!(original.remaining_qty, back.remaining_qty);
            assert_eq!(original.original_qty, back.original_qty);
        }
    }

    #[test]
    fn empty_record_inflates_to_empty_state() {
        let compressed = CompressedLots::default();
        assert_eq!(inflate(&compressed).unwrap(), Vec::new());
    }

    #[test]
    fn ragged_arrays_are_rejected() {
        let mut compressed = compress(&[TaxLot::new(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            dec!(100),
            dec!(50),
            None,
        )]);
        compressed.prices.push(dec!(1));
        assert_eq!(inflate(&compressed), Err(CodecError::RaggedArrays));
    }
}
