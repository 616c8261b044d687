//! Donations: 80G, 80GGA and 80GGC.

use rust_decimal::Decimal;

use crate::calculations::common::{clamp_non_negative, min, percent_of, round_half_up};
use crate::models::{ClaimDetail, DeductionClaim, DeductionSection, DonationCategory};

use super::{ClaimsBySection, SectionContext, SectionOutcome, claims_for};

fn donation_terms(claim: &DeductionClaim) -> (DonationCategory, bool) {
    match claim.detail {
        ClaimDetail::Donation {
            category,
            paid_in_cash,
        } => (category, paid_in_cash),
        // Unqualified 80G claims get the least generous treatment.
        _ => (DonationCategory::HalfWithLimit, false),
    }
}

/// 80G: 100% or 50% of the donation by category. Qualifying-limit
/// donations are first limited, in aggregate, to a share of adjusted
/// income; fully deductible ones draw on that limit first. Cash donations
/// above the cash limit are disallowed.
pub(super) fn charitable(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let section = DeductionSection::Sec80G;
    let section_claims = claims_for(claims, section);
    if section_claims.is_empty() {
        return outcome;
    }

    let limits = context.limits;
    let mut claimed = Decimal::ZERO;
    let mut unlimited = Decimal::ZERO;
    let mut limited_full = Decimal::ZERO;
    let mut limited_half = Decimal::ZERO;

    for claim in section_claims {
        let amount = clamp_non_negative(claim.claimed_amount);
        claimed += amount;
        let (category, paid_in_cash) = donation_terms(claim);
        if paid_in_cash && amount > limits.sec_80g_cash_limit {
            continue;
        }
        match category {
            DonationCategory::FullWithLimit => limited_full += amount,
            DonationCategory::HalfWithLimit => limited_half += amount,
            _ => unlimited += amount * category.eligible_share(),
        }
    }

    let mut qualifying_limit = percent_of(context.adjusted_income(), limits.sec_80g_qualifying_rate);
    let full_within = min(limited_full, qualifying_limit);
    qualifying_limit -= full_within;
    let half_within = min(limited_half, qualifying_limit);

    let allowed = round_half_up(
        unlimited
            + full_within * DonationCategory::FullWithLimit.eligible_share()
            + half_within * DonationCategory::HalfWithLimit.eligible_share(),
    );
    if allowed < claimed {
        outcome.cap_applied(section, claimed, allowed);
    }
    outcome.allow(section, allowed);
    outcome
}

/// 80GGA: scientific research and rural development, fully deductible.
/// Cash above the 80G cash limit is disallowed.
pub(super) fn scientific_research(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    fully_deductible(
        claims,
        DeductionSection::Sec80GGA,
        context.limits.sec_80g_cash_limit,
    )
}

/// 80GGC: political contributions; no cash at all.
pub(super) fn political(
    claims: &ClaimsBySection,
    _context: &SectionContext<'_>,
) -> SectionOutcome {
    fully_deductible(claims, DeductionSection::Sec80GGC, Decimal::ZERO)
}

fn fully_deductible(
    claims: &ClaimsBySection,
    section: DeductionSection,
    cash_limit: Decimal,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let section_claims = claims_for(claims, section);
    if section_claims.is_empty() {
        return outcome;
    }

    let mut claimed = Decimal::ZERO;
    let mut allowed = Decimal::ZERO;
    for claim in section_claims {
        let amount = clamp_non_negative(claim.claimed_amount);
        claimed += amount;
        let paid_in_cash = matches!(
            claim.detail,
            ClaimDetail::Donation {
                paid_in_cash: true,
                ..
            }
        );
        if !(paid_in_cash && amount > cash_limit) {
            allowed += amount;
        }
    }

    if allowed < claimed {
        outcome.cap_applied(section, claimed, allowed);
    }
    outcome.allow(section, allowed);
    outcome
}
