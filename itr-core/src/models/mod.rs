mod computation;
mod deduction;
mod financial_year;
mod income;
mod ledger;
mod profile;
mod return_document;
mod statutory;
mod tax_paid;
mod warnings;

pub use computation::{RegimeComputation, TaxComputationResult};
pub use deduction::{
    ClaimDetail, DeductionClaim, DeductionSection, DisabilitySeverity, DonationCategory,
    InsuredGroup,
};
pub use financial_year::{FinancialYear, FinancialYearParseError};
pub use income::{IncomeCategory, IncomeRecord, PRESUMPTIVE_SCHEMES, SalaryComponent};
pub use ledger::{DeductionLedger, IncomeLedger, SalaryBreakup, TaxBalance, TaxPaidSummary};
pub use profile::{Address, BalanceSheet, BankAccount, BusinessProfile, PersonalProfile};
pub use return_document::{DocumentStatus, FormType, NewReturnDocument, ReturnDocument};
pub use statutory::{
    AgeBand, AssessmentYearConfig, DeductionLimits, Regime, SurchargeBand, TaxSlab,
};
pub use tax_paid::{TaxPaidKind, TaxPaidRecord};
pub use warnings::ComputationWarning;
