use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Regime;

/// Liability under one regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeComputation {
    pub regime: Regime,
    pub gross_total_income: Decimal,
    pub total_deductions: Decimal,
    pub taxable_income: Decimal,
    pub tax_before_rebate: Decimal,
    pub rebate_87a: Decimal,
    pub surcharge: Decimal,
    pub cess: Decimal,
    pub net_tax_payable: Decimal,
}

/// Both regime computations and the regime with the lower liability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    pub old_regime: RegimeComputation,
    pub new_regime: RegimeComputation,
    pub recommended_regime: Regime,
}

impl TaxComputationResult {
    /// Pairs the two computations and recommends the cheaper regime.
    /// Ties go to the New regime, which carries no future lock-in.
    pub fn recommend(
        old_regime: RegimeComputation,
        new_regime: RegimeComputation,
    ) -> Self {
        let recommended_regime = if old_regime.net_tax_payable < new_regime.net_tax_payable {
            Regime::Old
        } else {
            Regime::New
        };
        Self {
            old_regime,
            new_regime,
            recommended_regime,
        }
    }

    pub fn for_regime(
        &self,
        regime: Regime,
    ) -> &RegimeComputation {
        match regime {
            Regime::Old => &self.old_regime,
            Regime::New => &self.new_regime,
        }
    }

    pub fn recommended(&self) -> &RegimeComputation {
        self.for_regime(self.recommended_regime)
    }

    /// How much the recommended regime saves over the other one.
    pub fn savings(&self) -> Decimal {
        (self.old_regime.net_tax_payable - self.new_regime.net_tax_payable).abs()
    }
}
