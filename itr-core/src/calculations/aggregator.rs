//! Income aggregation across categories.
//!
//! Each category arrives as its own fetch result. Successful fetches are
//! summed into an [`IncomeLedger`]; failed ones are excluded and reported
//! as [`ComputationWarning::IncompleteCategory`].

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::warn;

use crate::calculations::common::clamp_non_negative;
use crate::models::{
    ComputationWarning, IncomeCategory, IncomeLedger, IncomeRecord, SalaryBreakup,
    SalaryComponent,
};

/// Outcome of reading one category from its collaborator. The error side
/// carries a human-readable reason.
pub type CategoryFetch = (IncomeCategory, Result<Vec<IncomeRecord>, String>);

#[derive(Debug, Clone, Copy, Default)]
pub struct IncomeAggregator;

impl IncomeAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Builds the income ledger from per-category fetch results.
    ///
    /// Records are summed signed within a category, so a loss offsets
    /// income of the same category; the category total is clamped at zero.
    pub fn aggregate(
        &self,
        fetches: Vec<CategoryFetch>,
    ) -> (IncomeLedger, Vec<ComputationWarning>) {
        let mut ledger = IncomeLedger::default();
        let mut warnings = Vec::new();
        let mut properties = BTreeSet::new();

        for (category, fetched) in fetches {
            let records = match fetched {
                Ok(records) => records,
                Err(reason) => {
                    warn!(%category, %reason, "income category excluded");
                    ledger.incomplete_categories.insert(category);
                    warnings.push(ComputationWarning::IncompleteCategory { category, reason });
                    continue;
                }
            };

            if records.is_empty() {
                continue;
            }

            let category_net = self.category_net(&records);
            ledger.present_categories.insert(category);
            *ledger.by_category.entry(category).or_insert(Decimal::ZERO) += category_net;
            ledger.gross_total_income += category_net;

            for record in &records {
                if let Some(component) = record.salary_component() {
                    self.record_salary_component(&mut ledger.salary_breakup, component, record);
                }
                if record.category.is_business_or_profession() {
                    ledger.business_turnover += record.gross_amount;
                    ledger.business_expenses += record.allowable_expense;
                }
                match record.is_presumptive() {
                    Some(true) => ledger.presumptive_business = true,
                    Some(false) => ledger.regular_business = true,
                    None => {}
                }
                if record.category == IncomeCategory::HouseProperty {
                    properties.insert(record.source_ref.trim().to_string());
                }
            }
        }

        ledger.house_property_count = properties.len();
        (ledger, warnings)
    }

    fn category_net(
        &self,
        records: &[IncomeRecord],
    ) -> Decimal {
        clamp_non_negative(records.iter().map(IncomeRecord::net_amount).sum())
    }

    fn record_salary_component(
        &self,
        breakup: &mut SalaryBreakup,
        component: SalaryComponent,
        record: &IncomeRecord,
    ) {
        let slot = match component {
            SalaryComponent::Basic => &mut breakup.basic,
            SalaryComponent::DearnessAllowance => &mut breakup.dearness_allowance,
            SalaryComponent::HouseRentAllowance => &mut breakup.house_rent_allowance,
            SalaryComponent::EmployerNpsContribution => &mut breakup.employer_nps_contribution,
            SalaryComponent::Other => return,
        };
        *slot = Some(slot.unwrap_or(Decimal::ZERO) + record.net_amount());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::FinancialYear;

    fn record(
        category: IncomeCategory,
        subtype: &str,
        gross: Decimal,
        expense: Decimal,
        source_ref: &str,
    ) -> IncomeRecord {
        IncomeRecord {
            filer_id: "F1".to_string(),
            financial_year: FinancialYear(2024),
            category,
            subtype: subtype.to_string(),
            gross_amount: gross,
            allowable_expense: expense,
            computed_net: None,
            source_ref: source_ref.to_string(),
        }
    }

    // ===== totals tests =====

    #[test]
    fn sums_categories_into_gross_total_income() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![
            (
                IncomeCategory::Salary,
                Ok(vec![record(IncomeCategory::Salary, "gross", dec!(1000000), dec!(0), "emp-1")]),
            ),
            (
                IncomeCategory::Interest,
                Ok(vec![
                    record(IncomeCategory::Interest, "savings", dec!(8000), dec!(0), "bank-1"),
                    record(IncomeCategory::Interest, "fd", dec!(12000), dec!(0), "bank-2"),
                ]),
            ),
            (IncomeCategory::Dividend, Ok(vec![])),
        ];

        let (ledger, warnings) = aggregator.aggregate(fetches);

        assert!(warnings.is_empty());
        assert_eq!(ledger.gross_total_income, dec!(1020000));
        assert_eq!(ledger.net(IncomeCategory::Interest), dec!(20000));
        assert!(ledger.has(IncomeCategory::Salary));
        assert!(!ledger.has(IncomeCategory::Dividend));
    }

    #[test]
    fn loss_offsets_profit_within_category() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![(
            IncomeCategory::Business,
            Ok(vec![
                record(IncomeCategory::Business, "trading", dec!(100000), dec!(150000), "b-1"),
                record(IncomeCategory::Business, "trading", dec!(90000), dec!(40000), "b-2"),
            ]),
        )];

        let (ledger, _) = aggregator.aggregate(fetches);

        assert_eq!(ledger.net(IncomeCategory::Business), dec!(0));
        assert_eq!(ledger.gross_total_income, dec!(0));
        assert_eq!(ledger.business_turnover, dec!(190000));
        assert_eq!(ledger.business_expenses, dec!(190000));
        assert!(ledger.regular_business);
        assert!(!ledger.presumptive_business);
    }

    #[test]
    fn partial_loss_reduces_category_total() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![
            (
                IncomeCategory::HouseProperty,
                Ok(vec![
                    record(IncomeCategory::HouseProperty, "rent", dec!(200000), dec!(60000), "flat-a"),
                    record(IncomeCategory::HouseProperty, "self_occupied", dec!(0), dec!(50000), "flat-b"),
                ]),
            ),
            (
                IncomeCategory::Interest,
                Ok(vec![record(IncomeCategory::Interest, "fd", dec!(10000), dec!(0), "bank")]),
            ),
        ];

        let (ledger, _) = aggregator.aggregate(fetches);

        assert_eq!(ledger.net(IncomeCategory::HouseProperty), dec!(90000));
        assert_eq!(ledger.gross_total_income, dec!(100000));
    }

    #[test]
    fn loss_in_one_category_does_not_reduce_another() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![
            (
                IncomeCategory::Business,
                Ok(vec![record(IncomeCategory::Business, "trading", dec!(10000), dec!(80000), "b")]),
            ),
            (
                IncomeCategory::Salary,
                Ok(vec![record(IncomeCategory::Salary, "basic", dec!(600000), dec!(0), "emp")]),
            ),
        ];

        let (ledger, _) = aggregator.aggregate(fetches);

        assert_eq!(ledger.net(IncomeCategory::Business), dec!(0));
        assert_eq!(ledger.gross_total_income, dec!(600000));
    }

    // ===== failure tests =====

    #[test]
    fn failed_category_is_excluded_with_warning() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![
            (
                IncomeCategory::Salary,
                Ok(vec![record(IncomeCategory::Salary, "gross", dec!(500000), dec!(0), "emp")]),
            ),
            (IncomeCategory::CapitalGainsShort, Err("timed out".to_string())),
        ];

        let (ledger, warnings) = aggregator.aggregate(fetches);

        assert_eq!(ledger.gross_total_income, dec!(500000));
        assert!(ledger.incomplete_categories.contains(&IncomeCategory::CapitalGainsShort));
        assert_eq!(
            warnings,
            vec![ComputationWarning::IncompleteCategory {
                category: IncomeCategory::CapitalGainsShort,
                reason: "timed out".to_string(),
            }]
        );
    }

    // ===== derived facts tests =====

    #[test]
    fn extracts_salary_breakup() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![(
            IncomeCategory::Salary,
            Ok(vec![
                record(IncomeCategory::Salary, "basic", dec!(500000), dec!(0), "emp"),
                record(IncomeCategory::Salary, "da", dec!(100000), dec!(0), "emp"),
                record(IncomeCategory::Salary, "employer_nps", dec!(80000), dec!(0), "emp"),
                record(IncomeCategory::Salary, "special", dec!(220000), dec!(0), "emp"),
            ]),
        )];

        let (ledger, _) = aggregator.aggregate(fetches);

        assert_eq!(ledger.salary_breakup.basic_plus_da(), Some(dec!(600000)));
        assert_eq!(ledger.salary_breakup.employer_nps_contribution, Some(dec!(80000)));
        assert!(!ledger.salary_breakup.has_house_rent_allowance());
        assert_eq!(ledger.net(IncomeCategory::Salary), dec!(900000));
    }

    #[test]
    fn counts_distinct_house_properties() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![(
            IncomeCategory::HouseProperty,
            Ok(vec![
                record(IncomeCategory::HouseProperty, "rent", dec!(120000), dec!(36000), "flat-a"),
                record(IncomeCategory::HouseProperty, "arrears", dec!(10000), dec!(0), "flat-a"),
                record(IncomeCategory::HouseProperty, "rent", dec!(90000), dec!(27000), "flat-b"),
            ]),
        )];

        let (ledger, _) = aggregator.aggregate(fetches);

        assert_eq!(ledger.house_property_count, 2);
    }

    #[test]
    fn flags_presumptive_business() {
        let aggregator = IncomeAggregator::new();
        let fetches = vec![(
            IncomeCategory::Profession,
            Ok(vec![record(IncomeCategory::Profession, "44ADA", dec!(1200000), dec!(600000), "p")]),
        )];

        let (ledger, _) = aggregator.aggregate(fetches);

        assert!(ledger.presumptive_business);
        assert!(!ledger.regular_business);
    }
}
