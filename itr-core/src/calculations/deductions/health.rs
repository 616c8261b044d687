//! Medical insurance (80D) and disability (80DD, 80U).

use rust_decimal::Decimal;

use crate::calculations::common::clamp_non_negative;
use crate::models::{ClaimDetail, DeductionSection, DisabilitySeverity, InsuredGroup};

use super::{ClaimsBySection, SectionContext, SectionOutcome, claims_for};

/// 80D: the self-and-family and parents groups are capped independently,
/// each with the higher cap when the group includes a senior citizen.
/// Claims without a qualifier count towards the filer's own group.
pub(super) fn medical_insurance(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let section = DeductionSection::Sec80D;
    let section_claims = claims_for(claims, section);
    if section_claims.is_empty() {
        return outcome;
    }

    let mut own = (Decimal::ZERO, context.senior);
    let mut parents = (Decimal::ZERO, false);
    for claim in section_claims {
        let amount = clamp_non_negative(claim.claimed_amount);
        match claim.detail {
            ClaimDetail::MedicalInsurance {
                group: InsuredGroup::Parents,
                includes_senior,
            } => {
                parents.0 += amount;
                parents.1 |= includes_senior;
            }
            ClaimDetail::MedicalInsurance {
                group: InsuredGroup::SelfAndFamily,
                includes_senior,
            } => {
                own.0 += amount;
                own.1 |= includes_senior;
            }
            _ => own.0 += amount,
        }
    }

    let limits = context.limits;
    let own_cap = if own.1 {
        limits.sec_80d_self_senior_cap
    } else {
        limits.sec_80d_self_cap
    };
    let parents_cap = if parents.1 {
        limits.sec_80d_parents_senior_cap
    } else {
        limits.sec_80d_parents_cap
    };

    let mut total = Decimal::ZERO;
    for (claimed, cap) in [(own.0, own_cap), (parents.0, parents_cap)] {
        if claimed.is_zero() {
            continue;
        }
        let allowed = claimed.min(cap);
        if allowed < claimed {
            outcome.cap_applied(section, claimed, allowed);
        }
        total += allowed;
    }
    outcome.allow(section, total);
    outcome
}

/// 80DD: fixed amount for maintaining a disabled dependant.
pub(super) fn dependant_disability(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    fixed_by_severity(
        claims,
        DeductionSection::Sec80DD,
        context.limits.sec_80dd_amount,
        context.limits.sec_80dd_severe_amount,
    )
}

/// 80U: fixed amount for a filer with a disability.
pub(super) fn self_disability(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    fixed_by_severity(
        claims,
        DeductionSection::Sec80U,
        context.limits.sec_80u_amount,
        context.limits.sec_80u_severe_amount,
    )
}

/// The deduction does not depend on the amount spent, only on whether a
/// claim exists and how severe the disability is.
fn fixed_by_severity(
    claims: &ClaimsBySection,
    section: DeductionSection,
    amount: Decimal,
    severe_amount: Decimal,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let section_claims = claims_for(claims, section);
    if section_claims.is_empty() {
        return outcome;
    }

    let severe = section_claims.iter().any(|claim| {
        matches!(
            claim.detail,
            ClaimDetail::Disability {
                severity: DisabilitySeverity::Severe
            }
        )
    });
    outcome.allow(section, if severe { severe_amount } else { amount });
    outcome
}
