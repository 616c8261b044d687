//! Pure computation stages of the return pipeline.
//!
//! The aggregator, deduction calculator and reconciler are independent
//! leaves; the regime computer and form selector consume their outputs.

pub mod aggregator;
pub mod common;
pub mod deductions;
pub mod reconciler;
pub mod regime;
pub mod selector;

pub use aggregator::{CategoryFetch, IncomeAggregator};
pub use deductions::{
    ClaimsBySection, DeductionCalculator, SectionContext, SectionOutcome, SectionRule,
    group_claims,
};
pub use reconciler::{TaxPaidFetch, TaxPaidReconciler};
pub use regime::{RegimeComputationError, RegimeSchedule, RegimeTaxComputer};
pub use selector::{ReturnFlags, ReturnTypeSelector};
