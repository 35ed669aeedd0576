use std::time::Duration;

use posledger_instrument::TaxLotMethod;
use serde::{Deserialize, Serialize};

/// Result of a contract-rules lookup (spec §6). Defaults to
/// [`TaxLotMethod::Fifo`] on miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractRules {
    pub tax_lot_method: TaxLotMethod,
}

impl Default for ContractRules {
    fn default() -> Self {
        Self {
            tax_lot_method: TaxLotMethod::Fifo,
        }
    }
}

/// Contract for the external contract-rules lookup collaborator (spec §6).
/// Out of scope for this crate family: only the shape of the call is
/// specified, not its transport or caching.
pub trait ContractRulesProvider: Send + Sync {
    fn rules_for(&self, contract_id: &str) -> Option<ContractRules>;
}

/// Contract for the external IAM/entitlements collaborator (spec §6).
/// Implementations must fail closed in production.
pub trait EntitlementsService: Send + Sync {
    fn has_entitlement(&self, user_id: &str, function: &str) -> bool;
    fn has_account_access(&self, user_id: &str, account: &str) -> bool;
}

/// Contract for the metrics sink collaborator (spec §6): counter-increment
/// and timer-sample operations.
pub trait MetricsSink: Send + Sync {
    fn increment_counter(&self, name: &'static str, tags: &[(&'static str, &str)]);
    fn record_timer(&self, name: &'static str, elapsed: Duration, tags: &[(&'static str, &str)]);
}

/// Contract for the regulatory-submissions mirror (spec §6): best-effort,
/// never rolls back a committed transaction on failure.
pub trait RegulatorySink: Send + Sync {
    fn submit(&self, payload: &serde_json::Value);
}

/// No-op implementations for wiring the engine without live collaborators
/// (e.g. in tests, or before the surrounding deployment supplies real ones).
pub mod noop {
    use super::*;

    #[derive(Debug, Default)]
    pub struct NoopContractRulesProvider;

    impl ContractRulesProvider for NoopContractRulesProvider {
        fn rules_for(&self, _contract_id: &str) -> Option<ContractRules> {
            None
        }
    }

    #[derive(Debug, Default)]
    pub struct FailOpenEntitlementsService;

    impl EntitlementsService for FailOpenEntitlementsService {
        fn has_entitlement(&self, _user_id: &str, _function: &str) -> bool {
            true
        }

        fn has_account_access(&self, _user_id: &str, _account: &str) -> bool {
            true
        }
    }

    #[derive(Debug, Default)]
    pub struct NoopMetricsSink;

    impl MetricsSink for NoopMetricsSink {
        fn increment_counter(&self, _name: &'static str, _tags: &[(&'static str, &str)]) {}
        fn record_timer(
            &self,
            _name: &'static str,
            _elapsed: Duration,
            _tags: &[(&'static str, &str)],
        ) {
        }
    }

    #[derive(Debug, Default)]
    pub struct NoopRegulatorySink;

    impl RegulatorySink for NoopRegulatorySink {
        fn submit(&self, _payload: &serde_json::Value) {}
    }
}
