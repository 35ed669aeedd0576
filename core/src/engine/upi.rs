use chrono::{DateTime, NaiveDate, Utc};
use posledger_instrument::{PositionKey, PositionStatus, UpiChangeType, UpiHistoryRecord};

/// In-process append-only journal of position-identity lifecycle
/// transitions (spec §3, C10). Persistence of this journal lives alongside
/// the event/snapshot stores; this recorder only builds well-formed rows
/// and hands them to a sink closure, matching the hotpath/coldpath call
/// sites in spec §4.6/§4.8.
#[derive(Debug, Default)]
pub struct UpiRecorder {
    pub history: Vec<UpiHistoryRecord>,
}

impl UpiRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        position_key: PositionKey,
        upi: String,
        previous_upi: Option<String>,
        status: PositionStatus,
        previous_status: Option<PositionStatus>,
        change_type: UpiChangeType,
        triggering_trade_id: String,
        backdated_trade_id: Option<String>,
        effective_date: NaiveDate,
        occurred_at: DateTime<Utc>,
        merged_from_position_key: Option<PositionKey>,
        reason: Option<String>,
    ) {
        self.history.push(UpiHistoryRecord {
            position_key,
            upi,
            previous_upi,
            status,
            previous_status,
            change_type,
            triggering_trade_id,
            backdated_trade_id,
            effective_date,
            occurred_at,
            merged_from_position_key,
            reason,
        });
    }

    pub fn record_created(
        &mut self,
        position_key: PositionKey,
        upi: String,
        triggering_trade_id: String,
        effective_date: NaiveDate,
        occurred_at: DateTime<Utc>,
    ) {
        self.push(
            position_key,
            upi,
            None,
            PositionStatus::Active,
            None,
            UpiChangeType::Created,
            triggering_trade_id,
            None,
            effective_date,
            occurred_at,
            None,
            None,
        );
    }

    pub fn record_terminated(
        &mut self,
        position_key: PositionKey,
        upi: String,
        triggering_trade_id: String,
        effective_date: NaiveDate,
        occurred_at: DateTime<Utc>,
    ) {
        self.push(
            position_key,
            upi.clone(),
            Some(upi),
            PositionStatus::Terminated,
            Some(PositionStatus::Active),
            UpiChangeType::Terminated,
            triggering_trade_id,
            None,
            effective_date,
            occurred_at,
            None,
            None,
        );
    }

    pub fn record_reopened(
        &mut self,
        position_key: PositionKey,
        new_upi: String,
        previous_upi: String,
        triggering_trade_id: String,
        effective_date: NaiveDate,
        occurred_at: DateTime<Utc>,
    ) {
        self.push(
            position_key,
            new_upi,
            Some(previous_upi),
            PositionStatus::Active,
            Some(PositionStatus::Terminated),
            UpiChangeType::Reopened,
            triggering_trade_id,
            None,
            effective_date,
            occurred_at,
            None,
            None,
        );
    }

    pub fn record_merged(
        &mut self,
        position_key: PositionKey,
        upi: String,
        merged_from_position_key: PositionKey,
        triggering_trade_id: String,
        effective_date: NaiveDate,
        occurred_at: DateTime<Utc>,
    ) {
        self.push(
            position_key,
            upi,
            None,
            PositionStatus::Active,
            None,
            UpiChangeType::Merged,
            triggering_trade_id,
            None,
            effective_date,
            occurred_at,
            Some(merged_from_position_key),
            Some("UTI matched an existing position on correction".into()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posledger_instrument::Direction;

    #[test]
    fn records_created_then_terminated() {
        let mut recorder = UpiRecorder::new();
        let key = PositionKey::generate("acct", "aapl", "usd", Direction::Long);
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let now = Utc::now();
        recorder.record_created(key.clone(), "t1".into(), "t1".into(), date, now);
        recorder.record_terminated(key.clone(), "t1".into(), "t4".into(), date, now);
        assert_eq!(recorder.history.len(), 2);
        assert_eq!(recorder.history[1].change_type, UpiChangeType::Terminated);
        assert_eq!(recorder.history[1].previous_status, Some(PositionStatus::Active));
    }
}
