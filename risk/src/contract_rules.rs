use posledger_instrument::TaxLotMethod;
use posledger_integration::ContractRulesProvider;

/// Resolves the tax-lot consumption method for a trade from its
/// `contract_id`, falling back to FIFO when the trade carries no
/// `contract_id` or the provider has no rule for it (spec §4.7/§6).
pub fn resolve_tax_lot_method(
    provider: &dyn ContractRulesProvider,
    contract_id: Option<&str>,
) -> TaxLotMethod {
    contract_id
        .and_then(|id| provider.rules_for(id))
        .map(|rules| rules.tax_lot_method)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use posledger_integration::{noop::NoopContractRulesProvider, ContractRules};

    #[test]
    fn falls_back_to_fifo_when_no_contract_id() {
        let provider = NoopContractRulesProvider;
        assert_eq!(resolve_tax_lot_method(&provider, None), TaxLotMethod::Fifo);
    }

    struct FixedProvider(ContractRules);
    impl ContractRulesProvider for FixedProvider {
        fn rules_for(&self, _contract_id: &str) -> Option<ContractRules> {
            Some(self.0)
        }
    }

    #[test]
    fn uses_provider_rule_when_present() {
        let provider = FixedProvider(ContractRules {
            tax_lot_method: TaxLotMethod::Lifo,
        });
        assert_eq!(
            resolve_tax_lot_method(&provider, Some("C1")),
            TaxLotMethod::Lifo
        );
    }
}
