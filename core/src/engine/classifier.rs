use chrono::NaiveDate;
use posledger_instrument::Classification;

/// Classifies a trade's effective date against today and the position's
/// current snapshot date (spec §4.5, C6). `latest_snapshot_date` is the max
/// `trade_date` across open lots; `None` for a flat/new position.
pub fn classify(
    effective_date: NaiveDate,
    today: NaiveDate,
    latest_snapshot_date: Option<NaiveDate>,
) -> Classification {
    if effective_date > today {
        return Classification::ForwardDated;
    }
    if let Some(snapshot_date) = latest_snapshot_date {
        if effective_date < snapshot_date {
            return Classification::Backdated;
        }
    }
    Classification::CurrentDated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn future_effective_date_is_forward_dated() {
        assert_eq!(
            classify(date(2025, 2, 1), date(2025, 1, 20), Some(date(2025, 1, 15))),
            Classification::ForwardDated
        );
    }

    #[test]
    fn effective_before_snapshot_date_is_backdated() {
        assert_eq!(
            classify(date(2025, 1, 10), date(2025, 1, 20), Some(date(2025, 1, 15))),
            Classification::Backdated
        );
    }

    #[test]
    fn otherwise_current_dated_including_flat_position() {
        assert_eq!(
            classify(date(2025, 1, 20), date(2025, 1, 20), None),
            Classification::CurrentDated
        );
        assert_eq!(
            classify(date(2025, 1, 16), date(2025, 1, 20), Some(date(2025, 1, 15))),
            Classification::CurrentDated
        );
    }
}
