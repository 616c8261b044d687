//! Deposit interest: 80TTA for filers below 60, 80TTB for seniors.

use crate::models::DeductionSection;

use super::{ClaimsBySection, SectionContext, SectionOutcome, claims_for, total_claimed};

pub(super) fn deposit_interest(
    claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let limits = context.limits;

    let (applicable, cap, other, reason) = if context.senior {
        (
            DeductionSection::Sec80TTB,
            limits.sec_80ttb_cap,
            DeductionSection::Sec80TTA,
            "senior citizens claim under 80TTB",
        )
    } else {
        (
            DeductionSection::Sec80TTA,
            limits.sec_80tta_cap,
            DeductionSection::Sec80TTB,
            "80TTB is available to senior citizens only",
        )
    };

    if !claims_for(claims, applicable).is_empty() {
        outcome.allow_capped(applicable, total_claimed(claims, applicable), cap);
    }
    if !claims_for(claims, other).is_empty() {
        outcome.inapplicable(other, reason);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::super::fixtures::{claim, income, limits};
    use super::super::group_claims;
    use super::*;
    use crate::models::{ComputationWarning, IncomeCategory};

    #[test]
    fn non_senior_capped_under_80tta() {
        let limits = limits();
        let income = income(&[(IncomeCategory::Interest, dec!(30000))]);
        let context = SectionContext::new(&limits, &income, false, dec!(50000));
        let claims = group_claims(vec![claim(DeductionSection::Sec80TTA, dec!(14000))]);

        let outcome = deposit_interest(&claims, &context);

        assert_eq!(outcome.allowed, vec![(DeductionSection::Sec80TTA, dec!(10000))]);
    }

    #[test]
    fn senior_gets_higher_cap_under_80ttb() {
        let limits = limits();
        let income = income(&[(IncomeCategory::Interest, dec!(90000))]);
        let context = SectionContext::new(&limits, &income, true, dec!(50000));
        let claims = group_claims(vec![claim(DeductionSection::Sec80TTB, dec!(60000))]);

        let outcome = deposit_interest(&claims, &context);

        assert_eq!(outcome.allowed, vec![(DeductionSection::Sec80TTB, dec!(50000))]);
    }

    #[test]
    fn senior_claiming_80tta_is_inapplicable() {
        let limits = limits();
        let income = income(&[(IncomeCategory::Interest, dec!(90000))]);
        let context = SectionContext::new(&limits, &income, true, dec!(50000));
        let claims = group_claims(vec![claim(DeductionSection::Sec80TTA, dec!(8000))]);

        let outcome = deposit_interest(&claims, &context);

        assert_eq!(outcome.allowed, vec![(DeductionSection::Sec80TTA, dec!(0))]);
        assert_eq!(
            outcome.warnings,
            vec![ComputationWarning::InapplicableSection {
                section: DeductionSection::Sec80TTA,
                reason: "senior citizens claim under 80TTB".to_string(),
            }]
        );
    }
}
