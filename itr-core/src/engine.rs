//! The per-filer pipeline.
//!
//! A request reads the filer's records, runs the calculation stages in
//! dependency order and optionally persists a return document:
//!
//! | Stage | Component |
//! |-------|-----------|
//! | 1 | Profile, income, claims, tax paid, limits and surcharge bands read concurrently |
//! | 2 | Income aggregation |
//! | 3 | Deductions for both regimes |
//! | 4 | Tax-paid reconciliation |
//! | 5 | Regime computation and recommendation |
//! | 6 | Form selection |
//! | 7 | Document generation (generate/regenerate only) |
//!
//! Each collaborator read is bounded by the collaborator timeout; a slow
//! income category, claim section or tax-paid kind is excluded with a
//! warning. The whole computation is bounded by the request timeout, and a
//! request that times out persists nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::calculations::{
    CategoryFetch, DeductionCalculator, IncomeAggregator, RegimeSchedule, RegimeTaxComputer,
    ReturnFlags, ReturnTypeSelector, SectionContext, TaxPaidFetch, TaxPaidReconciler,
    group_claims,
};
use crate::db::{RepositoryError, TaxRepository};
use crate::document::{ReturnDocumentGenerator, ReturnInputs};
use crate::error::EngineError;
use crate::models::{
    AgeBand, AssessmentYearConfig, ComputationWarning, DeductionClaim, DeductionLedger,
    DeductionSection, DocumentStatus, FinancialYear, FormType, IncomeCategory, IncomeLedger,
    NewReturnDocument, PersonalProfile, Regime, ReturnDocument, SurchargeBand, TaxBalance,
    TaxComputationResult, TaxPaidKind, TaxPaidSummary, TaxSlab,
};
use crate::settings::EngineSettings;

/// Everything a computation produced, with warnings in the order they were
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationOutcome {
    pub filer_id: String,
    pub financial_year: FinancialYear,
    pub age_band: AgeBand,
    pub income: IncomeLedger,
    pub old_deductions: DeductionLedger,
    pub new_deductions: DeductionLedger,
    pub result: TaxComputationResult,
    pub tax_paid: TaxPaidSummary,
    /// Balance under the recommended regime.
    pub balance: TaxBalance,
    pub form_type: FormType,
    pub warnings: Vec<ComputationWarning>,
}

impl ComputationOutcome {
    pub fn deductions_for(
        &self,
        regime: Regime,
    ) -> &DeductionLedger {
        match regime {
            Regime::Old => &self.old_deductions,
            Regime::New => &self.new_deductions,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub filer_id: String,
    pub financial_year: FinancialYear,
    /// Regime to file under; the recommended regime when `None`.
    pub regime: Option<Regime>,
}

impl GenerateRequest {
    pub fn new(
        filer_id: impl Into<String>,
        financial_year: FinancialYear,
    ) -> Self {
        Self {
            filer_id: filer_id.into(),
            financial_year,
            regime: None,
        }
    }

    pub fn with_regime(
        mut self,
        regime: Regime,
    ) -> Self {
        self.regime = Some(regime);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub document: ReturnDocument,
    pub computation: ComputationOutcome,
}

/// A computation together with the inputs document generation still needs.
struct Computation {
    outcome: ComputationOutcome,
    profile: PersonalProfile,
    config: AssessmentYearConfig,
}

pub struct TaxEngine<R: TaxRepository + ?Sized> {
    repository: Arc<R>,
    settings: EngineSettings,
    aggregator: IncomeAggregator,
    calculator: DeductionCalculator,
    reconciler: TaxPaidReconciler,
    generator: ReturnDocumentGenerator,
}

impl<R: TaxRepository + ?Sized> TaxEngine<R> {
    pub fn new(
        repository: Arc<R>,
        settings: EngineSettings,
    ) -> Self {
        Self::with_generator(repository, settings, ReturnDocumentGenerator::default())
    }

    pub fn with_generator(
        repository: Arc<R>,
        settings: EngineSettings,
        generator: ReturnDocumentGenerator,
    ) -> Self {
        Self {
            repository,
            settings,
            aggregator: IncomeAggregator::new(),
            calculator: DeductionCalculator::new(),
            reconciler: TaxPaidReconciler::new(),
            generator,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Computes liability under both regimes without persisting anything.
    ///
    /// # Errors
    /// * [`EngineError::UnsupportedAssessmentYear`] when the year has no
    ///   statutory configuration.
    /// * [`EngineError::Repository`] when the profile or statutory tables
    ///   cannot be read.
    /// * [`EngineError::Timeout`] when the request deadline passes.
    pub async fn compute_tax(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Result<ComputationOutcome, EngineError> {
        let deadline = self.settings.request_timeout();
        let computation = within(deadline, self.compute(filer_id, financial_year)).await?;
        Ok(computation.outcome)
    }

    /// Runs the full pipeline and persists a return document, superseding
    /// any earlier document for the same filer, year and form.
    pub async fn generate_return(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerationOutcome, EngineError> {
        let deadline = self.settings.request_timeout();
        let (document, computation) = within(deadline, self.prepare(request)).await?;

        let saved = self
            .repository
            .save_return_document(document)
            .await
            .map_err(EngineError::Persistence)?;
        info!(
            id = saved.id,
            filer = %saved.filer_id,
            form = %saved.form_type,
            warnings = saved.warnings.len(),
            "return document generated"
        );

        Ok(GenerationOutcome {
            document: saved,
            computation,
        })
    }

    /// Generates again for a filer and year that already has a return on
    /// file. Fails with `Repository(NotFound)` when nothing was generated
    /// before. When the selected form has changed, live documents of the
    /// old form are superseded too.
    pub async fn regenerate_return(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerationOutcome, EngineError> {
        let history = self.history(&request.filer_id, request.financial_year).await?;
        let live: Vec<&ReturnDocument> = history
            .iter()
            .filter(|d| d.status != DocumentStatus::Superseded)
            .collect();
        if live.is_empty() {
            return Err(EngineError::Repository(RepositoryError::NotFound));
        }
        debug!(previous = live[0].id, filer = %request.filer_id, "regenerating return");

        let outcome = self.generate_return(request).await?;
        for stale in live
            .into_iter()
            .filter(|d| d.form_type != outcome.document.form_type)
        {
            self.repository
                .mark_superseded(stale.id)
                .await
                .map_err(EngineError::Persistence)?;
            info!(
                id = stale.id,
                form = %stale.form_type,
                replaced_by = outcome.document.id,
                "superseded return of previous form"
            );
        }
        Ok(outcome)
    }

    /// Returns a stored document after verifying its checksum, and marks it
    /// downloaded.
    ///
    /// # Errors
    /// * [`EngineError::DocumentSuperseded`] for superseded documents.
    /// * [`EngineError::Integrity`] when the stored payload no longer
    ///   matches its checksum.
    pub async fn download_return(
        &self,
        id: i64,
    ) -> Result<ReturnDocument, EngineError> {
        let mut document = self
            .repository
            .get_return_document(id)
            .await
            .map_err(EngineError::Repository)?;

        if document.status == DocumentStatus::Superseded {
            return Err(EngineError::DocumentSuperseded(id));
        }
        ReturnDocumentGenerator::verify(&document)?;

        self.repository
            .mark_downloaded(id)
            .await
            .map_err(EngineError::Persistence)?;
        document.status = DocumentStatus::Downloaded;
        info!(id, filer = %document.filer_id, "return document downloaded");
        Ok(document)
    }

    /// Every document generated for a filer and year, newest first.
    pub async fn history(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Result<Vec<ReturnDocument>, EngineError> {
        self.repository
            .list_return_documents(filer_id, financial_year)
            .await
            .map_err(EngineError::Repository)
    }

    /// Generates returns for many filers with bounded concurrency. Each
    /// request succeeds or fails on its own; results arrive in completion
    /// order.
    pub async fn generate_bulk(
        &self,
        requests: Vec<GenerateRequest>,
    ) -> Vec<(GenerateRequest, Result<GenerationOutcome, EngineError>)> {
        let concurrency = self.settings.bulk_concurrency();
        info!(requests = requests.len(), concurrency, "bulk generation started");

        let results: Vec<_> = futures::stream::iter(requests)
            .map(|request| async move {
                let result = self.generate_return(&request).await;
                if let Err(error) = &result {
                    warn!(filer = %request.filer_id, %error, "bulk generation failed for filer");
                }
                (request, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(total = results.len(), failed, "bulk generation finished");
        results
    }

    async fn prepare(
        &self,
        request: &GenerateRequest,
    ) -> Result<(NewReturnDocument, ComputationOutcome), EngineError> {
        let computation = self.compute(&request.filer_id, request.financial_year).await?;
        let outcome = &computation.outcome;
        let regime = request.regime.unwrap_or(outcome.result.recommended_regime);

        let inputs = ReturnInputs {
            financial_year: outcome.financial_year,
            form_type: outcome.form_type,
            regime,
            profile: &computation.profile,
            income: &outcome.income,
            deductions: outcome.deductions_for(regime),
            computation: &outcome.result,
            tax_paid: &outcome.tax_paid,
            config: &computation.config,
            warnings: &outcome.warnings,
        };
        let document = self.generator.prepare(&inputs)?;
        Ok((document, computation.outcome))
    }

    async fn compute(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Result<Computation, EngineError> {
        let assessment_year = financial_year.assessment_year();
        let config = self.assessment_year_config(assessment_year).await?;
        debug!(filer = filer_id, %financial_year, schema = %config.schema_version, "computing tax");

        let (profile, income_fetches, section_fetches, tax_paid_fetches, limits, surcharges) = tokio::join!(
            self.fatal(self.repository.fetch_profile(filer_id)),
            self.fetch_income(filer_id, financial_year),
            self.fetch_claims(filer_id, financial_year),
            self.fetch_tax_paid(filer_id, financial_year),
            self.fatal(self.repository.get_deduction_limits(assessment_year)),
            self.surcharge_bands(assessment_year),
        );
        let profile = profile?;
        let limits = limits?;
        let (old_surcharge, new_surcharge) = surcharges?;

        let age_band = age_band_for(&profile, financial_year, &config);
        let (old_slabs, new_slabs) = self.slabs(assessment_year, age_band).await?;

        let (income, mut warnings) = self.aggregator.aggregate(income_fetches);

        let mut claims = Vec::new();
        for (section, fetched) in section_fetches {
            match fetched {
                Ok(records) => claims.extend(records),
                Err(reason) => {
                    warn!(%section, %reason, "claims unavailable");
                    warnings.push(ComputationWarning::IncompleteSection { section, reason });
                }
            }
        }
        let claims = group_claims(claims);

        let senior = age_band.is_senior();
        let old_context = SectionContext::new(
            &limits,
            &income,
            senior,
            config.standard_deduction(Regime::Old),
        );
        let new_context = SectionContext::new(
            &limits,
            &income,
            senior,
            config.standard_deduction(Regime::New),
        );
        let (old_deductions, old_warnings) =
            self.calculator.calculate(Regime::Old, &claims, &old_context);
        let (new_deductions, new_warnings) =
            self.calculator.calculate(Regime::New, &claims, &new_context);
        warnings.extend(old_warnings);
        warnings.extend(new_warnings);

        let (tax_paid, tax_paid_warnings) = self.reconciler.reconcile(tax_paid_fetches);
        warnings.extend(tax_paid_warnings);

        let old_regime = RegimeTaxComputer::new(RegimeSchedule {
            regime: Regime::Old,
            slabs: &old_slabs,
            rebate_threshold: config.rebate_threshold(Regime::Old),
            rebate_max: config.rebate_max(Regime::Old),
            surcharge_bands: &old_surcharge,
            cess_rate: config.cess_rate,
        })
        .compute(income.gross_total_income, old_deductions.total_deductions)?;
        let new_regime = RegimeTaxComputer::new(RegimeSchedule {
            regime: Regime::New,
            slabs: &new_slabs,
            rebate_threshold: config.rebate_threshold(Regime::New),
            rebate_max: config.rebate_max(Regime::New),
            surcharge_bands: &new_surcharge,
            cess_rate: config.cess_rate,
        })
        .compute(income.gross_total_income, new_deductions.total_deductions)?;
        let result = TaxComputationResult::recommend(old_regime, new_regime);

        let balance = tax_paid.balance(result.recommended().net_tax_payable);
        let form_type =
            ReturnTypeSelector::new(config.form1_income_ceiling, config.form4_income_ceiling)
                .select(&ReturnFlags::from_ledger(
                    &income,
                    profile.company_director,
                    result.recommended().taxable_income,
                ));

        info!(
            filer = filer_id,
            %financial_year,
            form = %form_type,
            recommended = %result.recommended_regime,
            old_tax = %result.old_regime.net_tax_payable,
            new_tax = %result.new_regime.net_tax_payable,
            warnings = warnings.len(),
            "tax computed"
        );

        Ok(Computation {
            outcome: ComputationOutcome {
                filer_id: filer_id.to_string(),
                financial_year,
                age_band,
                income,
                old_deductions,
                new_deductions,
                result,
                tax_paid,
                balance,
                form_type,
                warnings,
            },
            profile,
            config,
        })
    }

    async fn assessment_year_config(
        &self,
        assessment_year: i32,
    ) -> Result<AssessmentYearConfig, EngineError> {
        let read = self.repository.get_assessment_year_config(assessment_year);
        match self.fatal(read).await {
            Err(EngineError::Repository(RepositoryError::NotFound)) => {
                Err(EngineError::UnsupportedAssessmentYear(assessment_year))
            }
            other => other,
        }
    }

    async fn fetch_income(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Vec<CategoryFetch> {
        join_all(IncomeCategory::ALL.into_iter().map(|category| async move {
            let read = self.repository.fetch_income(filer_id, financial_year, category);
            (category, self.bounded(read).await)
        }))
        .await
    }

    async fn fetch_claims(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Vec<(DeductionSection, Result<Vec<DeductionClaim>, String>)> {
        join_all(DeductionSection::claimable().map(|section| async move {
            let read = self.repository.fetch_claims(filer_id, financial_year, section);
            (section, self.bounded(read).await)
        }))
        .await
    }

    async fn fetch_tax_paid(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Vec<TaxPaidFetch> {
        join_all(TaxPaidKind::ALL.into_iter().map(|kind| async move {
            let read = self.repository.fetch_tax_paid(filer_id, financial_year, kind);
            (kind, self.bounded(read).await)
        }))
        .await
    }

    async fn surcharge_bands(
        &self,
        assessment_year: i32,
    ) -> Result<(Vec<SurchargeBand>, Vec<SurchargeBand>), EngineError> {
        let (old, new) = tokio::join!(
            self.fatal(self.repository.get_surcharge_bands(assessment_year, Regime::Old)),
            self.fatal(self.repository.get_surcharge_bands(assessment_year, Regime::New)),
        );
        Ok((old?, new?))
    }

    async fn slabs(
        &self,
        assessment_year: i32,
        age_band: AgeBand,
    ) -> Result<(Vec<TaxSlab>, Vec<TaxSlab>), EngineError> {
        let (old, new) = tokio::join!(
            self.fatal(self.repository.get_tax_slabs(assessment_year, Regime::Old, age_band)),
            self.fatal(self.repository.get_tax_slabs(assessment_year, Regime::New, age_band)),
        );
        Ok((old?, new?))
    }

    /// A read whose failure only excludes part of the computation.
    async fn bounded<T>(
        &self,
        read: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, String> {
        let limit = self.settings.collaborator_timeout();
        match timeout(limit, read).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(error.to_string()),
            Err(_) => Err(format!("timed out after {} ms", millis(limit))),
        }
    }

    /// A read the computation cannot proceed without.
    async fn fatal<T>(
        &self,
        read: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, EngineError> {
        let limit = self.settings.collaborator_timeout();
        match timeout(limit, read).await {
            Ok(result) => result.map_err(EngineError::Repository),
            Err(_) => Err(EngineError::Timeout {
                elapsed_ms: millis(limit),
            }),
        }
    }
}

/// Age band on the last day of the financial year. A filer without a date
/// of birth is treated as below 60; the generator reports the missing date.
fn age_band_for(
    profile: &PersonalProfile,
    financial_year: FinancialYear,
    config: &AssessmentYearConfig,
) -> AgeBand {
    match (profile.date_of_birth, financial_year.last_day()) {
        (Some(date_of_birth), Some(as_of)) => AgeBand::classify(
            date_of_birth,
            as_of,
            config.senior_age,
            config.super_senior_age,
        ),
        _ => AgeBand::Below60,
    }
}

async fn within<T>(
    deadline: Duration,
    work: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    match timeout(deadline, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(deadline_ms = millis(deadline), "request timed out");
            Err(EngineError::Timeout {
                elapsed_ms: millis(deadline),
            })
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn config() -> AssessmentYearConfig {
        AssessmentYearConfig {
            assessment_year: 2025,
            schema_version: "2025-26.1".to_string(),
            standard_deduction_old: dec!(50000),
            standard_deduction_new: dec!(75000),
            rebate_threshold_old: dec!(500000),
            rebate_max_old: dec!(12500),
            rebate_threshold_new: dec!(700000),
            rebate_max_new: dec!(25000),
            cess_rate: dec!(0.04),
            form1_income_ceiling: dec!(5000000),
            form4_income_ceiling: dec!(5000000),
            senior_age: 60,
            super_senior_age: 80,
        }
    }

    fn born(
        year: i32,
        month: u32,
        day: u32,
    ) -> PersonalProfile {
        PersonalProfile {
            date_of_birth: NaiveDate::from_ymd_opt(year, month, day),
            ..Default::default()
        }
    }

    // ===== age band tests =====

    #[test]
    fn age_band_measured_on_last_day_of_year() {
        let config = config();

        let turns_sixty_on_31_march = age_band_for(&born(1965, 3, 31), FinancialYear(2024), &config);
        let turns_sixty_on_1_april = age_band_for(&born(1965, 4, 1), FinancialYear(2024), &config);

        assert_eq!(turns_sixty_on_31_march, AgeBand::Senior);
        assert_eq!(turns_sixty_on_1_april, AgeBand::Below60);
    }

    #[test]
    fn missing_date_of_birth_is_below_sixty() {
        let profile = PersonalProfile::default();

        let result = age_band_for(&profile, FinancialYear(2024), &config());

        assert_eq!(result, AgeBand::Below60);
    }

    // ===== deadline tests =====

    #[tokio::test]
    async fn within_passes_through_results() {
        let result = within(Duration::from_millis(100), async { Ok::<_, EngineError>(7) }).await;

        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn within_reports_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, EngineError>(())
        };

        let result = within(Duration::from_millis(250), slow).await;

        assert_eq!(result, Err(EngineError::Timeout { elapsed_ms: 250 }));
    }

    #[test]
    fn generate_request_builder_sets_regime() {
        let request = GenerateRequest::new("F1", FinancialYear(2024)).with_regime(Regime::Old);

        assert_eq!(request.regime, Some(Regime::Old));
        assert_eq!(request.filer_id, "F1");
    }
}
