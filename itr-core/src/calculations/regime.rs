//! Liability under one regime.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Taxable income: gross total income less deductions, min 0, rounded to the nearest ten (s.288A) |
//! | 2    | Tax from the progressive slab table |
//! | 3    | Rebate u/s 87A when taxable income is within the threshold |
//! | 4    | Surcharge on tax after rebate, at the highest band whose minimum is exceeded |
//! | 5    | Health and education cess on tax after rebate plus surcharge |
//! | 6    | Net tax, min 0, rounded to the nearest ten (s.288B) |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use itr_core::calculations::{RegimeSchedule, RegimeTaxComputer};
//! use itr_core::{AgeBand, Regime, TaxSlab};
//!
//! let slab = |min, max, rate, base| TaxSlab {
//!     assessment_year: 2025,
//!     regime: Regime::Old,
//!     age_band: AgeBand::Below60,
//!     min_income: min,
//!     max_income: max,
//!     tax_rate: rate,
//!     base_tax: base,
//! };
//! let slabs = vec![
//!     slab(dec!(0), Some(dec!(250000)), dec!(0), dec!(0)),
//!     slab(dec!(250000), Some(dec!(500000)), dec!(0.05), dec!(0)),
//!     slab(dec!(500000), Some(dec!(1000000)), dec!(0.20), dec!(12500)),
//!     slab(dec!(1000000), None, dec!(0.30), dec!(112500)),
//! ];
//! let schedule = RegimeSchedule {
//!     regime: Regime::Old,
//!     slabs: &slabs,
//!     rebate_threshold: dec!(500000),
//!     rebate_max: dec!(12500),
//!     surcharge_bands: &[],
//!     cess_rate: dec!(0.04),
//! };
//!
//! let result = RegimeTaxComputer::new(schedule)
//!     .compute(dec!(1000000), dec!(200000))
//!     .unwrap();
//!
//! assert_eq!(result.taxable_income, dec!(800000));
//! assert_eq!(result.tax_before_rebate, dec!(72500));
//! assert_eq!(result.net_tax_payable, dec!(75400));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::common::{clamp_non_negative, min, round_rupee, round_to_nearest_ten};
use crate::models::{Regime, RegimeComputation, SurchargeBand, TaxSlab};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegimeComputationError {
    #[error("no tax slabs configured for the {0} regime")]
    NoTaxSlabs(Regime),

    #[error("no tax slab covers taxable income {0}")]
    NoMatchingSlab(Decimal),
}

/// Statutory tables for one regime and assessment year.
#[derive(Debug, Clone, Copy)]
pub struct RegimeSchedule<'a> {
    pub regime: Regime,
    /// Sorted by `min_income`; the last slab is open-ended.
    pub slabs: &'a [TaxSlab],
    pub rebate_threshold: Decimal,
    pub rebate_max: Decimal,
    pub surcharge_bands: &'a [SurchargeBand],
    pub cess_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct RegimeTaxComputer<'a> {
    schedule: RegimeSchedule<'a>,
}

impl<'a> RegimeTaxComputer<'a> {
    pub fn new(schedule: RegimeSchedule<'a>) -> Self {
        Self { schedule }
    }

    pub fn compute(
        &self,
        gross_total_income: Decimal,
        total_deductions: Decimal,
    ) -> Result<RegimeComputation, RegimeComputationError> {
        if self.schedule.slabs.is_empty() {
            return Err(RegimeComputationError::NoTaxSlabs(self.schedule.regime));
        }

        let taxable_income = self.taxable_income(gross_total_income, total_deductions);
        let tax_before_rebate = self.slab_tax(taxable_income)?;
        let rebate_87a = self.rebate(taxable_income, tax_before_rebate);
        let tax_after_rebate = tax_before_rebate - rebate_87a;
        let surcharge = self.surcharge(taxable_income, tax_after_rebate);
        let cess = self.cess(tax_after_rebate + surcharge);
        let net_tax_payable = self.net_tax(tax_after_rebate + surcharge + cess);

        Ok(RegimeComputation {
            regime: self.schedule.regime,
            gross_total_income,
            total_deductions,
            taxable_income,
            tax_before_rebate,
            rebate_87a,
            surcharge,
            cess,
            net_tax_payable,
        })
    }

    fn taxable_income(
        &self,
        gross_total_income: Decimal,
        total_deductions: Decimal,
    ) -> Decimal {
        round_to_nearest_ten(clamp_non_negative(gross_total_income - total_deductions))
    }

    /// `base_tax + (income - min_income) * rate` for the slab containing
    /// the income, i.e. `min_income < income <= max_income`.
    fn slab_tax(
        &self,
        taxable_income: Decimal,
    ) -> Result<Decimal, RegimeComputationError> {
        if taxable_income <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let slab = self
            .schedule
            .slabs
            .iter()
            .find(|s| {
                taxable_income > s.min_income
                    && s.max_income.is_none_or(|max| taxable_income <= max)
            })
            .ok_or(RegimeComputationError::NoMatchingSlab(taxable_income))?;

        let marginal_income = taxable_income - slab.min_income;
        Ok(round_rupee(slab.base_tax + marginal_income * slab.tax_rate))
    }

    fn rebate(
        &self,
        taxable_income: Decimal,
        tax: Decimal,
    ) -> Decimal {
        if taxable_income <= self.schedule.rebate_threshold {
            min(tax, self.schedule.rebate_max)
        } else {
            Decimal::ZERO
        }
    }

    fn surcharge(
        &self,
        taxable_income: Decimal,
        tax_after_rebate: Decimal,
    ) -> Decimal {
        let rate = self
            .schedule
            .surcharge_bands
            .iter()
            .filter(|band| taxable_income > band.min_income)
            .max_by_key(|band| band.min_income)
            .map(|band| band.rate)
            .unwrap_or(Decimal::ZERO);
        round_rupee(tax_after_rebate * rate)
    }

    fn cess(
        &self,
        tax_with_surcharge: Decimal,
    ) -> Decimal {
        round_rupee(tax_with_surcharge * self.schedule.cess_rate)
    }

    fn net_tax(
        &self,
        total: Decimal,
    ) -> Decimal {
        round_to_nearest_ten(clamp_non_negative(total))
    }
}
