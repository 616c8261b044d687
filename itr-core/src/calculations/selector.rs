//! Return-form selection as a single ordered decision table.
//!
//! | # | Condition | Form |
//! |---|-----------|------|
//! | 1 | Foreign asset, company director, or regular-books business/profession | ITR3 |
//! | 2 | Presumptive business/profession with total income within the Form 4 ceiling | ITR4 |
//! | 2a| Presumptive business/profession with total income above the Form 4 ceiling | ITR3 |
//! | 3 | Capital gains, VDA, several house properties, other categories, or total income above the Form 1 ceiling | ITR2 |
//! | 4 | Otherwise | ITR1 |
//!
//! Total income is taxable income under the recommended regime, after
//! deductions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{FormType, IncomeCategory, IncomeLedger};

/// Facts about a filer that drive form selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReturnFlags {
    pub has_foreign_asset: bool,
    pub company_director: bool,
    pub regular_business: bool,
    pub presumptive_business: bool,
    pub has_capital_gains: bool,
    pub has_virtual_digital_asset: bool,
    pub house_property_count: usize,
    /// Income from any category Form 1 does not cover.
    pub has_other_category: bool,
    /// Income after deductions, compared against the form ceilings.
    pub total_income: Decimal,
}

/// Categories Form 1 can carry.
const FORM1_CATEGORIES: [IncomeCategory; 5] = [
    IncomeCategory::Salary,
    IncomeCategory::HouseProperty,
    IncomeCategory::Interest,
    IncomeCategory::Dividend,
    IncomeCategory::OtherSources,
];

impl ReturnFlags {
    pub fn from_ledger(
        ledger: &IncomeLedger,
        company_director: bool,
        total_income: Decimal,
    ) -> Self {
        let has_capital_gains = ledger.has(IncomeCategory::CapitalGainsShort)
            || ledger.has(IncomeCategory::CapitalGainsLong);
        let has_other_category = ledger.present_categories.iter().any(|category| {
            !FORM1_CATEGORIES.contains(category) && !category.is_business_or_profession()
        });

        Self {
            has_foreign_asset: ledger.has(IncomeCategory::ForeignAsset),
            company_director,
            regular_business: ledger.regular_business,
            presumptive_business: ledger.presumptive_business,
            has_capital_gains,
            has_virtual_digital_asset: ledger.has(IncomeCategory::VirtualDigitalAsset),
            house_property_count: ledger.house_property_count,
            has_other_category,
            total_income,
        }
    }

    fn has_form2_income(&self) -> bool {
        self.has_capital_gains || self.has_virtual_digital_asset || self.house_property_count > 1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnTypeSelector {
    form1_income_ceiling: Decimal,
    form4_income_ceiling: Decimal,
}

impl ReturnTypeSelector {
    pub fn new(
        form1_income_ceiling: Decimal,
        form4_income_ceiling: Decimal,
    ) -> Self {
        Self {
            form1_income_ceiling,
            form4_income_ceiling,
        }
    }

    /// First matching row wins; every combination of flags selects a form.
    pub fn select(
        &self,
        flags: &ReturnFlags,
    ) -> FormType {
        if flags.has_foreign_asset || flags.company_director || flags.regular_business {
            return FormType::Itr3;
        }

        if flags.presumptive_business {
            if flags.total_income > self.form4_income_ceiling {
                return FormType::Itr3;
            }
            return FormType::Itr4;
        }

        if flags.has_form2_income()
            || flags.has_other_category
            || flags.total_income > self.form1_income_ceiling
        {
            return FormType::Itr2;
        }

        FormType::Itr1
    }
}
