use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DeductionSection, IncomeCategory, Regime, TaxPaidKind};

/// Salary components relevant to 80CCD(1), 80CCD(2) and 80GG.
/// A component is `None` when no breakup entry carried that tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SalaryBreakup {
    pub basic: Option<Decimal>,
    pub dearness_allowance: Option<Decimal>,
    pub house_rent_allowance: Option<Decimal>,
    pub employer_nps_contribution: Option<Decimal>,
}

impl SalaryBreakup {
    pub fn has_house_rent_allowance(&self) -> bool {
        self.house_rent_allowance.is_some()
    }

    /// Basic pay plus dearness allowance, when both are present.
    pub fn basic_plus_da(&self) -> Option<Decimal> {
        Some(self.basic? + self.dearness_allowance?)
    }
}

/// Normalized income for one filer and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IncomeLedger {
    pub by_category: BTreeMap<IncomeCategory, Decimal>,
    pub gross_total_income: Decimal,
    pub present_categories: BTreeSet<IncomeCategory>,
    pub incomplete_categories: BTreeSet<IncomeCategory>,
    pub salary_breakup: SalaryBreakup,
    /// Distinct house properties (by source reference).
    pub house_property_count: usize,
    pub presumptive_business: bool,
    pub regular_business: bool,
    /// Gross receipts across business and profession records.
    pub business_turnover: Decimal,
    /// Allowable expenses across business and profession records.
    pub business_expenses: Decimal,
}

impl IncomeLedger {
    pub fn net(
        &self,
        category: IncomeCategory,
    ) -> Decimal {
        self.by_category
            .get(&category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn has(
        &self,
        category: IncomeCategory,
    ) -> bool {
        self.present_categories.contains(&category)
    }

    pub fn capital_gains(&self) -> Decimal {
        self.net(IncomeCategory::CapitalGainsShort) + self.net(IncomeCategory::CapitalGainsLong)
    }
}

/// Capped deductions for one regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLedger {
    pub regime: Regime,
    pub by_section: BTreeMap<DeductionSection, Decimal>,
    pub total_deductions: Decimal,
    /// Set when a derived section lacked its source records.
    pub data_incomplete: bool,
}

impl DeductionLedger {
    pub fn amount(
        &self,
        section: DeductionSection,
    ) -> Decimal {
        self.by_section
            .get(&section)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Chapter VI-A total, i.e. everything except the standard deduction.
    pub fn chapter_via_total(&self) -> Decimal {
        self.total_deductions - self.amount(DeductionSection::Standard)
    }
}

/// Tax already discharged, for display and reconciliation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaxPaidSummary {
    pub by_kind: BTreeMap<TaxPaidKind, Decimal>,
    pub total_tax_paid: Decimal,
}

impl TaxPaidSummary {
    pub fn amount(
        &self,
        kind: TaxPaidKind,
    ) -> Decimal {
        self.by_kind.get(&kind).copied().unwrap_or(Decimal::ZERO)
    }

    /// Outstanding balance after offsetting tax already paid.
    pub fn balance(
        &self,
        net_tax_payable: Decimal,
    ) -> TaxBalance {
        let difference = net_tax_payable - self.total_tax_paid;
        if difference >= Decimal::ZERO {
            TaxBalance::Payable(difference)
        } else {
            TaxBalance::Refundable(-difference)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxBalance {
    Payable(Decimal),
    Refundable(Decimal),
}

impl TaxBalance {
    pub fn payable(&self) -> Decimal {
        match self {
            Self::Payable(amount) => *amount,
            Self::Refundable(_) => Decimal::ZERO,
        }
    }

    pub fn refundable(&self) -> Decimal {
        match self {
            Self::Payable(_) => Decimal::ZERO,
            Self::Refundable(amount) => *amount,
        }
    }
}
