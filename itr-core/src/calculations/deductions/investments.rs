//! Retirement and savings sections: 80C, 80CCC, 80CCD(1), 80CCD(1B), 80CCD(2).

use rust_decimal::Decimal;

use crate::calculations::common::{min, percent_of};
use crate::models::{ComputationWarning, DeductionSection, IncomeCategory};

use super::{ClaimsBySection, SectionContext, SectionOutcome, claims_for, total_claimed};

/// Allocation order inside the combined ceiling.
const COMBINED: [DeductionSection; 3] = [
    DeductionSection::Sec80C,
    DeductionSection::Sec80CCC,
    DeductionSection::Sec80CCD1,
];

/// 80C, 80CCC and 80CCD(1): each clamped to its own cap, then the three
/// together clamped to the combined ceiling.
pub(super) fn combined_savings(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let limits = context.limits;
    let mut remaining = limits.sec_80c_combined_ceiling;

    for section in COMBINED {
        if claims_for(claims, section).is_empty() {
            continue;
        }
        let claimed = total_claimed(claims, section);
        let own_cap = match section {
            DeductionSection::Sec80C => limits.sec_80c_cap,
            DeductionSection::Sec80CCC => limits.sec_80ccc_cap,
            _ => min(limits.sec_80ccd1_cap, nps_contribution_limit(context)),
        };

        let individually = min(claimed, own_cap);
        let allowed = min(individually, remaining);
        remaining -= allowed;

        if allowed < claimed {
            outcome.cap_applied(section, claimed, allowed);
        }
        outcome.allow(section, allowed);
    }

    outcome
}

/// 80CCD(1) is limited to a share of basic + DA for salaried filers,
/// otherwise to a share of gross total income.
fn nps_contribution_limit(context: &SectionContext<'_>) -> Decimal {
    let limits = context.limits;
    match context.income.salary_breakup.basic_plus_da() {
        Some(basic_plus_da) => percent_of(basic_plus_da, limits.sec_80ccd1_salary_rate),
        None => percent_of(
            context.income.gross_total_income,
            limits.sec_80ccd1_income_rate,
        ),
    }
}

/// 80CCD(1B): additional NPS contribution outside the combined ceiling.
pub(super) fn additional_nps(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    if !claims_for(claims, DeductionSection::Sec80CCD1B).is_empty() {
        outcome.allow_capped(
            DeductionSection::Sec80CCD1B,
            total_claimed(claims, DeductionSection::Sec80CCD1B),
            context.limits.sec_80ccd1b_cap,
        );
    }
    outcome
}

/// 80CCD(2): derived from the salary breakup, never claimed.
///
/// Evaluated for salaried filers only. A missing employer contribution or
/// a missing basic/DA entry leaves the section at zero and flags the
/// ledger as data-incomplete.
pub(super) fn employer_nps(
    _claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let section = DeductionSection::Sec80CCD2;
    if !context.income.has(IncomeCategory::Salary) {
        return outcome;
    }

    let breakup = &context.income.salary_breakup;
    let mut missing = Vec::new();
    if breakup.basic.is_none() {
        missing.push("salary.basic".to_string());
    }
    if breakup.dearness_allowance.is_none() {
        missing.push("salary.dearness_allowance".to_string());
    }
    if breakup.employer_nps_contribution.is_none() {
        missing.push("salary.employer_nps_contribution".to_string());
    }

    match (breakup.employer_nps_contribution, breakup.basic_plus_da()) {
        (Some(contribution), Some(basic_plus_da)) => {
            let limit = percent_of(basic_plus_da, context.limits.sec_80ccd2_rate);
            outcome.allow_capped(section, contribution, limit);
        }
        _ => {
            outcome.allow(section, Decimal::ZERO);
            outcome.data_incomplete = true;
            outcome
                .warnings
                .push(ComputationWarning::DataIncomplete { section, missing });
        }
    }

    outcome
}
