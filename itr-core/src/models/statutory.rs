use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of the two alternative tax-computation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// The deduction-permitting regime (Chapter VI-A allowed).
    Old,
    /// The default regime with lower slabs and only the standard deduction.
    New,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Old => "OLD",
            Self::New => "NEW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OLD" => Some(Self::Old),
            "NEW" => Some(Self::New),
            _ => None,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age bracket of the filer on the last day of the financial year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    Below60,
    Senior,
    SuperSenior,
}

impl AgeBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Below60 => "BELOW_60",
            Self::Senior => "SENIOR",
            Self::SuperSenior => "SUPER_SENIOR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BELOW_60" => Some(Self::Below60),
            "SENIOR" => Some(Self::Senior),
            "SUPER_SENIOR" => Some(Self::SuperSenior),
            _ => None,
        }
    }

    /// Classifies a date of birth against the configured age thresholds,
    /// measured on `as_of` (normally the last day of the financial year).
    pub fn classify(
        date_of_birth: NaiveDate,
        as_of: NaiveDate,
        senior_age: u32,
        super_senior_age: u32,
    ) -> Self {
        let age = age_on(date_of_birth, as_of);
        if age >= super_senior_age {
            Self::SuperSenior
        } else if age >= senior_age {
            Self::Senior
        } else {
            Self::Below60
        }
    }

    pub fn is_senior(&self) -> bool {
        !matches!(self, Self::Below60)
    }
}

fn age_on(
    date_of_birth: NaiveDate,
    as_of: NaiveDate,
) -> u32 {
    let mut years = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Per-assessment-year parameters that are not slab rows or deduction caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentYearConfig {
    pub assessment_year: i32,
    /// Version label of the return JSON schema active for this year.
    pub schema_version: String,
    pub standard_deduction_old: Decimal,
    pub standard_deduction_new: Decimal,
    pub rebate_threshold_old: Decimal,
    pub rebate_max_old: Decimal,
    pub rebate_threshold_new: Decimal,
    pub rebate_max_new: Decimal,
    pub cess_rate: Decimal,
    /// Gross total income above which Form 1 is unavailable.
    pub form1_income_ceiling: Decimal,
    /// Gross total income above which Form 4 is unavailable.
    pub form4_income_ceiling: Decimal,
    pub senior_age: u32,
    pub super_senior_age: u32,
}

impl AssessmentYearConfig {
    pub fn standard_deduction(
        &self,
        regime: Regime,
    ) -> Decimal {
        match regime {
            Regime::Old => self.standard_deduction_old,
            Regime::New => self.standard_deduction_new,
        }
    }

    pub fn rebate_threshold(
        &self,
        regime: Regime,
    ) -> Decimal {
        match regime {
            Regime::Old => self.rebate_threshold_old,
            Regime::New => self.rebate_threshold_new,
        }
    }

    pub fn rebate_max(
        &self,
        regime: Regime,
    ) -> Decimal {
        match regime {
            Regime::Old => self.rebate_max_old,
            Regime::New => self.rebate_max_new,
        }
    }
}

/// One progressive slab row: income in `(min_income, max_income]` is taxed at
/// `base_tax + (income - min_income) * tax_rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub assessment_year: i32,
    pub regime: Regime,
    pub age_band: AgeBand,
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
    pub base_tax: Decimal,
}

/// Surcharge rate applying once taxable income exceeds `min_income`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeBand {
    pub assessment_year: i32,
    pub regime: Regime,
    pub min_income: Decimal,
    pub rate: Decimal,
}

/// Every statutory cap, ceiling and rate used by the Chapter VI-A rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLimits {
    pub assessment_year: i32,
    /// Combined ceiling for 80C + 80CCC + 80CCD(1).
    pub sec_80c_combined_ceiling: Decimal,
    pub sec_80c_cap: Decimal,
    pub sec_80ccc_cap: Decimal,
    pub sec_80ccd1_cap: Decimal,
    /// 80CCD(1) limit as a share of basic + DA for salaried filers.
    pub sec_80ccd1_salary_rate: Decimal,
    /// 80CCD(1) limit as a share of gross total income otherwise.
    pub sec_80ccd1_income_rate: Decimal,
    pub sec_80ccd1b_cap: Decimal,
    /// Employer NPS contribution limit as a share of basic + DA.
    pub sec_80ccd2_rate: Decimal,
    pub sec_80d_self_cap: Decimal,
    pub sec_80d_self_senior_cap: Decimal,
    pub sec_80d_parents_cap: Decimal,
    pub sec_80d_parents_senior_cap: Decimal,
    pub sec_80dd_amount: Decimal,
    pub sec_80dd_severe_amount: Decimal,
    pub sec_80u_amount: Decimal,
    pub sec_80u_severe_amount: Decimal,
    pub sec_80gg_monthly_ceiling: Decimal,
    /// Share of adjusted income that caps 80GG.
    pub sec_80gg_income_rate: Decimal,
    /// Share of adjusted income subtracted from rent paid.
    pub sec_80gg_rent_excess_rate: Decimal,
    /// Share of adjusted income capping qualifying-limit donations.
    pub sec_80g_qualifying_rate: Decimal,
    /// Largest cash donation still eligible under 80G.
    pub sec_80g_cash_limit: Decimal,
    pub sec_80eea_cap: Decimal,
    pub sec_80eeb_cap: Decimal,
    pub sec_80tta_cap: Decimal,
    pub sec_80ttb_cap: Decimal,
}
