use std::time::Duration;

use posledger_instrument::TaxLotMethod;

/// Exponential-backoff parameters for the hotpath retry loop (spec §6:
/// `hotpath.max_attempts` = 5, `hotpath.backoff_ms` = 25 base, ×1.5, cap 200).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotpathConfig {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_multiplier: f64,
    pub backoff_cap_ms: u64,
    pub budget: Duration,
}

impl Default for HotpathConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base_ms: 25,
            backoff_multiplier: 1.5,
            backoff_cap_ms: 200,
            budget: Duration::from_millis(100),
        }
    }
}

/// Linear-backoff parameters for the coldpath retry loop (spec §6:
/// `coldpath.max_attempts` = 5, `coldpath.backoff_ms` = 100 × attempt).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColdpathConfig {
    pub max_attempts: u32,
    pub backoff_step_ms: u64,
    pub budget: Duration,
}

impl Default for ColdpathConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step_ms: 100,
            budget: Duration::from_secs(5 * 60),
        }
    }
}

/// Field/bound limits enforced by the validator (spec §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatorConfig {
    pub max_price: rust_decimal::Decimal,
    pub max_future_years: i32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: rust_decimal::Decimal::from(1_000_000),
            max_future_years: 1,
        }
    }
}

/// Top-level engine configuration, aggregating every literal named in
/// spec §6. Not sourced from a file/env layer here — the surrounding
/// deployment owns config loading; this struct is the typed target it
/// populates.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    pub hotpath: HotpathConfig,
    pub coldpath: ColdpathConfig,
    pub validator: ValidatorConfig,
    pub snapshot_compression_threshold_lots: usize,
    pub default_tax_lot_method: TaxLotMethod,
    pub cache_ttl: Duration,
    pub iam_cache_ttl: Duration,
    pub allow_sign_change_split: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            hotpath: HotpathConfig::default(),
            coldpath: ColdpathConfig::default(),
            validator: ValidatorConfig::default(),
            snapshot_compression_threshold_lots: 10,
            default_tax_lot_method: TaxLotMethod::Fifo,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            iam_cache_ttl: Duration::from_secs(5 * 60),
            allow_sign_change_split: true,
        }
    }
}
