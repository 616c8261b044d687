use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AgeBand, AssessmentYearConfig, DeductionClaim, DeductionLimits, DeductionSection,
    FinancialYear, FormType, IncomeCategory, IncomeRecord, NewReturnDocument, PersonalProfile,
    Regime, ReturnDocument, SurchargeBand, TaxPaidKind, TaxPaidRecord, TaxSlab,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Read contract offered by the data-capture collaborators.
/// The engine never writes through this trait.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_income(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        category: IncomeCategory,
    ) -> Result<Vec<IncomeRecord>, RepositoryError>;

    async fn fetch_claims(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        section: DeductionSection,
    ) -> Result<Vec<DeductionClaim>, RepositoryError>;

    async fn fetch_tax_paid(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        kind: TaxPaidKind,
    ) -> Result<Vec<TaxPaidRecord>, RepositoryError>;

    async fn fetch_profile(&self, filer_id: &str) -> Result<PersonalProfile, RepositoryError>;
}

/// Versioned statutory data keyed by assessment year.
#[async_trait]
pub trait StatutoryConfigSource: Send + Sync {
    async fn get_assessment_year_config(
        &self,
        assessment_year: i32,
    ) -> Result<AssessmentYearConfig, RepositoryError>;

    async fn list_assessment_years(&self) -> Result<Vec<i32>, RepositoryError>;

    /// Slab rows sorted by `min_income`.
    async fn get_tax_slabs(
        &self,
        assessment_year: i32,
        regime: Regime,
        age_band: AgeBand,
    ) -> Result<Vec<TaxSlab>, RepositoryError>;

    async fn get_surcharge_bands(
        &self,
        assessment_year: i32,
        regime: Regime,
    ) -> Result<Vec<SurchargeBand>, RepositoryError>;

    async fn get_deduction_limits(
        &self,
        assessment_year: i32,
    ) -> Result<DeductionLimits, RepositoryError>;

    async fn insert_tax_slab(&self, slab: &TaxSlab) -> Result<(), RepositoryError>;

    async fn delete_tax_slabs(
        &self,
        assessment_year: i32,
        regime: Regime,
        age_band: AgeBand,
    ) -> Result<(), RepositoryError>;
}

/// Persistence for generated return documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Saves a new document and marks every live document for the same
    /// filer, year and form as superseded, atomically.
    async fn save_return_document(
        &self,
        document: NewReturnDocument,
    ) -> Result<ReturnDocument, RepositoryError>;

    async fn get_return_document(&self, id: i64) -> Result<ReturnDocument, RepositoryError>;

    /// The newest non-superseded document for a filer, year and form.
    async fn latest_return_document(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        form_type: FormType,
    ) -> Result<ReturnDocument, RepositoryError>;

    /// Every document for a filer and year, newest first.
    async fn list_return_documents(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Result<Vec<ReturnDocument>, RepositoryError>;

    async fn mark_downloaded(&self, id: i64) -> Result<(), RepositoryError>;

    /// Retires a live document; `NotFound` when it is missing or already
    /// superseded.
    async fn mark_superseded(&self, id: i64) -> Result<(), RepositoryError>;
}

/// Everything the engine needs from a storage backend.
pub trait TaxRepository: RecordSource + StatutoryConfigSource + DocumentStore {}

impl<T> TaxRepository for T where T: RecordSource + StatutoryConfigSource + DocumentStore {}
