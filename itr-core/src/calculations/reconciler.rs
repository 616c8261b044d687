//! Tax already paid or withheld.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{ComputationWarning, TaxPaidKind, TaxPaidRecord, TaxPaidSummary};

pub type TaxPaidFetch = (TaxPaidKind, Result<Vec<TaxPaidRecord>, String>);

#[derive(Debug, Clone, Copy, Default)]
pub struct TaxPaidReconciler;

impl TaxPaidReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Sums amounts per kind. Every kind appears in the summary; kinds with
    /// no records or a failed read contribute zero.
    pub fn reconcile(
        &self,
        fetches: Vec<TaxPaidFetch>,
    ) -> (TaxPaidSummary, Vec<ComputationWarning>) {
        let mut by_kind: BTreeMap<TaxPaidKind, Decimal> =
            TaxPaidKind::ALL.into_iter().map(|k| (k, Decimal::ZERO)).collect();
        let mut warnings = Vec::new();

        for (kind, fetched) in fetches {
            match fetched {
                Ok(records) => {
                    let sum: Decimal = records.iter().map(|r| r.amount).sum();
                    *by_kind.entry(kind).or_insert(Decimal::ZERO) += sum;
                }
                Err(reason) => {
                    warn!(%kind, %reason, "tax-paid records unavailable");
                    warnings.push(ComputationWarning::IncompleteTaxPaid { kind, reason });
                }
            }
        }

        let total_tax_paid = by_kind.values().copied().sum();
        (
            TaxPaidSummary {
                by_kind,
                total_tax_paid,
            },
            warnings,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::FinancialYear;

    fn paid(
        kind: TaxPaidKind,
        amount: Decimal,
    ) -> TaxPaidRecord {
        TaxPaidRecord {
            filer_id: "F1".to_string(),
            financial_year: FinancialYear(2024),
            kind,
            amount,
            reference: "ref".to_string(),
        }
    }

    #[test]
    fn sums_per_kind_and_overall() {
        let reconciler = TaxPaidReconciler::new();
        let fetches = vec![
            (
                TaxPaidKind::Tds,
                Ok(vec![paid(TaxPaidKind::Tds, dec!(30000)), paid(TaxPaidKind::Tds, dec!(12000))]),
            ),
            (TaxPaidKind::AdvanceTax, Ok(vec![paid(TaxPaidKind::AdvanceTax, dec!(10000))])),
        ];

        let (summary, warnings) = reconciler.reconcile(fetches);

        assert!(warnings.is_empty());
        assert_eq!(summary.amount(TaxPaidKind::Tds), dec!(42000));
        assert_eq!(summary.amount(TaxPaidKind::Tcs), dec!(0));
        assert_eq!(summary.total_tax_paid, dec!(52000));
        assert_eq!(summary.by_kind.len(), TaxPaidKind::ALL.len());
    }

    #[test]
    fn failed_kind_contributes_zero_with_warning() {
        let reconciler = TaxPaidReconciler::new();
        let fetches = vec![
            (TaxPaidKind::Tds, Ok(vec![paid(TaxPaidKind::Tds, dec!(30000))])),
            (TaxPaidKind::SelfAssessment, Err("connection reset".to_string())),
        ];

        let (summary, warnings) = reconciler.reconcile(fetches);

        assert_eq!(summary.total_tax_paid, dec!(30000));
        assert_eq!(
            warnings,
            vec![ComputationWarning::IncompleteTaxPaid {
                kind: TaxPaidKind::SelfAssessment,
                reason: "connection reset".to_string(),
            }]
        );
    }
}
