use posledger::core::LedgerConfig;
use posledger::instrument::{TradeEvent, TradeType};
use posledger::system::System;
use rust_decimal_macros::dec;

#[tokio::test]
async fn submitted_trade_produces_an_applied_snapshot() {
    let mut system = System::new(2, LedgerConfig::default());

    let trade = TradeEvent::new(
        "sys-1".into(),
        "ACC1".into(),
        "AAPL".into(),
        "USD".into(),
        TradeType::NewTrade,
        dec!(100),
        dec!(50.00),
        chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
    );
    system.submit(trade).unwrap();

    let message = system.outbound().recv().await.expect("one outbound message");
    assert_eq!(message.payload.summary_metrics.total_qty, dec!(100));

    system.shutdown().await;
}
