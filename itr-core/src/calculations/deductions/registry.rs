use crate::models::{DeductionSection, Regime};

use super::{
    ClaimsBySection, SectionContext, SectionOutcome, donations, health, housing, interest,
    investments,
};

/// A pure deduction rule and the sections it produces.
pub struct SectionRule {
    pub sections: &'static [DeductionSection],
    pub compute: fn(&ClaimsBySection, &SectionContext<'_>) -> SectionOutcome,
}

impl SectionRule {
    pub fn produces(
        &self,
        section: DeductionSection,
    ) -> bool {
        self.sections.contains(&section)
    }
}

fn standard_deduction(
    _claims: &ClaimsBySection,
    context: &SectionContext<'_>,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    outcome.allow(DeductionSection::Standard, context.standard_deduction);
    outcome
}

const STANDARD: SectionRule = SectionRule {
    sections: &[DeductionSection::Standard],
    compute: standard_deduction,
};

pub static NEW_REGIME_RULES: &[SectionRule] = &[STANDARD];

pub static OLD_REGIME_RULES: &[SectionRule] = &[
    STANDARD,
    SectionRule {
        sections: &[
            DeductionSection::Sec80C,
            DeductionSection::Sec80CCC,
            DeductionSection::Sec80CCD1,
        ],
        compute: investments::combined_savings,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80CCD1B],
        compute: investments::additional_nps,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80CCD2],
        compute: investments::employer_nps,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80D],
        compute: health::medical_insurance,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80DD],
        compute: health::dependant_disability,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80U],
        compute: health::self_disability,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80GG],
        compute: housing::rent_paid,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80E],
        compute: housing::education_loan,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80EEA],
        compute: housing::home_loan,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80EEB],
        compute: housing::vehicle_loan,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80G],
        compute: donations::charitable,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80GGA],
        compute: donations::scientific_research,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80GGC],
        compute: donations::political,
    },
    SectionRule {
        sections: &[DeductionSection::Sec80TTA, DeductionSection::Sec80TTB],
        compute: interest::deposit_interest,
    },
];

pub fn rules_for(regime: Regime) -> &'static [SectionRule] {
    match regime {
        Regime::Old => OLD_REGIME_RULES,
        Regime::New => NEW_REGIME_RULES,
    }
}
