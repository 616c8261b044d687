//! Rent (80GG) and loan-interest sections (80E, 80EEA, 80EEB).

use rust_decimal::Decimal;

use crate::calculations::common::{clamp_non_negative, min, percent_of};
use crate::models::DeductionSection;

use super::{ClaimsBySection, SectionContext, SectionOutcome, claims_for, total_claimed};

/// 80GG: rent paid by a filer who receives no house-rent allowance.
///
/// `min(rent - 10% of adjusted income, monthly ceiling * 12,
/// 25% of adjusted income)`, floored at zero.
pub(super) fn rent_paid(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let section = DeductionSection::Sec80GG;
    if claims_for(claims, section).is_empty() {
        return outcome;
    }

    if context.income.salary_breakup.has_house_rent_allowance() {
        outcome.inapplicable(section, "house rent allowance received");
        return outcome;
    }

    let limits = context.limits;
    let rent = total_claimed(claims, section);
    let adjusted_income = context.adjusted_income();

    let rent_excess = rent - percent_of(adjusted_income, limits.sec_80gg_rent_excess_rate);
    let annual_ceiling = limits.sec_80gg_monthly_ceiling * Decimal::from(12);
    let income_cap = percent_of(adjusted_income, limits.sec_80gg_income_rate);

    let allowed = clamp_non_negative(min(rent_excess, min(annual_ceiling, income_cap)));
    if allowed < rent {
        outcome.cap_applied(section, rent, allowed);
    }
    outcome.allow(section, allowed);
    outcome
}

/// 80E: education-loan interest, no amount cap.
pub(super) fn education_loan(
    claims: &ClaimsBySection,
    _context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let section = DeductionSection::Sec80E;
    if !claims_for(claims, section).is_empty() {
        outcome.allow(section, total_claimed(claims, section));
    }
    outcome
}

pub(super) fn home_loan(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    capped(claims, DeductionSection::Sec80EEA, context.limits.sec_80eea_cap)
}

pub(super) fn vehicle_loan(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    capped(claims, DeductionSection::Sec80EEB, context.limits.sec_80eeb_cap)
}

fn capped(
    claims: &ClaimsBySection,
    section: DeductionSection,
    cap: Decimal,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    if !claims_for(claims, section).is_empty() {
        outcome.allow_capped(section, total_claimed(claims, section), cap);
    }
    outcome
}
