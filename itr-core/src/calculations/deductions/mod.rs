//! Chapter VI-A deductions and the standard deduction.
//!
//! Each section is a pure rule over the filer's claims and a read-only
//! [`SectionContext`]. Rules live in a registry keyed by the sections they
//! produce; the [`DeductionCalculator`] runs the rules that apply to a
//! regime and sums their outcomes into a [`DeductionLedger`].

mod donations;
mod health;
mod housing;
mod interest;
mod investments;
mod registry;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::{clamp_non_negative, min};
use crate::models::{
    ComputationWarning, DeductionClaim, DeductionLedger, DeductionLimits, DeductionSection,
    IncomeCategory, IncomeLedger, Regime,
};

pub use registry::{NEW_REGIME_RULES, OLD_REGIME_RULES, SectionRule, rules_for};

/// Claims grouped by the section they target.
pub type ClaimsBySection = BTreeMap<DeductionSection, Vec<DeductionClaim>>;

/// Groups a flat list of claims by section.
pub fn group_claims(claims: impl IntoIterator<Item = DeductionClaim>) -> ClaimsBySection {
    let mut grouped = ClaimsBySection::new();
    for claim in claims {
        grouped.entry(claim.section).or_default().push(claim);
    }
    grouped
}

/// Everything a rule may read besides the claims themselves.
#[derive(Debug, Clone)]
pub struct SectionContext<'a> {
    pub limits: &'a DeductionLimits,
    pub income: &'a IncomeLedger,
    /// Filer is 60 or older at the end of the financial year.
    pub senior: bool,
    /// Standard deduction already limited to net salary.
    pub standard_deduction: Decimal,
}

impl<'a> SectionContext<'a> {
    /// `configured_standard` is the regime's flat amount; the context keeps
    /// the smaller of it and net salary, or zero without salary income.
    pub fn new(
        limits: &'a DeductionLimits,
        income: &'a IncomeLedger,
        senior: bool,
        configured_standard: Decimal,
    ) -> Self {
        let standard_deduction = if income.has(IncomeCategory::Salary) {
            min(configured_standard, income.net(IncomeCategory::Salary))
        } else {
            Decimal::ZERO
        };
        Self {
            limits,
            income,
            senior,
            standard_deduction,
        }
    }

    /// Gross total income less capital gains and the standard deduction.
    pub fn adjusted_income(&self) -> Decimal {
        clamp_non_negative(
            self.income.gross_total_income - self.income.capital_gains() - self.standard_deduction,
        )
    }
}

/// What one rule contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionOutcome {
    pub allowed: Vec<(DeductionSection, Decimal)>,
    pub warnings: Vec<ComputationWarning>,
    pub data_incomplete: bool,
}

impl SectionOutcome {
    pub fn allow(
        &mut self,
        section: DeductionSection,
        amount: Decimal,
    ) {
        self.allowed.push((section, amount));
    }

    /// Allows `min(claimed, cap)` and records a warning when the cap bites.
    pub fn allow_capped(
        &mut self,
        section: DeductionSection,
        claimed: Decimal,
        cap: Decimal,
    ) -> Decimal {
        let allowed = min(claimed, cap);
        if allowed < claimed {
            self.cap_applied(section, claimed, allowed);
        }
        self.allow(section, allowed);
        allowed
    }

    pub fn cap_applied(
        &mut self,
        section: DeductionSection,
        claimed: Decimal,
        allowed: Decimal,
    ) {
        self.warnings.push(ComputationWarning::CapApplied {
            section,
            claimed,
            allowed,
        });
    }

    pub fn inapplicable(
        &mut self,
        section: DeductionSection,
        reason: &str,
    ) {
        self.allow(section, Decimal::ZERO);
        self.warnings.push(ComputationWarning::InapplicableSection {
            section,
            reason: reason.to_string(),
        });
    }
}

/// Claims for one section, or an empty slice.
pub(crate) fn claims_for<'c>(
    claims: &'c ClaimsBySection,
    section: DeductionSection,
) -> &'c [DeductionClaim] {
    claims.get(&section).map(Vec::as_slice).unwrap_or(&[])
}

/// Sum of claimed amounts for one section, ignoring negative entries.
pub(crate) fn total_claimed(
    claims: &ClaimsBySection,
    section: DeductionSection,
) -> Decimal {
    claims_for(claims, section)
        .iter()
        .map(|c| clamp_non_negative(c.claimed_amount))
        .sum()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeductionCalculator;

impl DeductionCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Runs every rule registered for `regime` and totals the result.
    pub fn calculate(
        &self,
        regime: Regime,
        claims: &ClaimsBySection,
        context: &SectionContext<'_>,
    ) -> (DeductionLedger, Vec<ComputationWarning>) {
        let mut by_section = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut data_incomplete = false;

        for rule in rules_for(regime) {
            let outcome = (rule.compute)(claims, context);
            for (section, amount) in outcome.allowed {
                *by_section.entry(section).or_insert(Decimal::ZERO) += amount;
            }
            for warning in &outcome.warnings {
                warn!(%regime, %warning, "deduction warning");
            }
            warnings.extend(outcome.warnings);
            data_incomplete |= outcome.data_incomplete;
        }

        let total_deductions = by_section.values().copied().sum();
        debug!(%regime, %total_deductions, sections = by_section.len(), "deductions calculated");

        (
            DeductionLedger {
                regime,
                by_section,
                total_deductions,
                data_incomplete,
            },
            warnings,
        )
    }
}
