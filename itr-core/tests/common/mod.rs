//! In-memory repository used by the engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use itr_core::{
    Address, AgeBand, AssessmentYearConfig, BankAccount, ClaimDetail, DeductionClaim,
    DeductionLimits, DeductionSection, DocumentStatus, DocumentStore, FinancialYear, FormType,
    IncomeCategory, IncomeRecord, NewReturnDocument, PersonalProfile, RecordSource, Regime,
    RepositoryError, ReturnDocument, StatutoryConfigSource, SurchargeBand, TaxPaidKind,
    TaxPaidRecord, TaxSlab,
};

pub const FILER: &str = "F1";
pub const YEAR: FinancialYear = FinancialYear(2024);

/// A read that never finishes on its own.
const STALL: Duration = Duration::from_secs(3600);

#[derive(Default)]
pub struct MemoryRepository {
    profiles: Mutex<HashMap<String, PersonalProfile>>,
    income: Mutex<Vec<IncomeRecord>>,
    claims: Mutex<Vec<DeductionClaim>>,
    tax_paid: Mutex<Vec<TaxPaidRecord>>,
    configs: Mutex<HashMap<i32, AssessmentYearConfig>>,
    limits: Mutex<HashMap<i32, DeductionLimits>>,
    slabs: Mutex<Vec<TaxSlab>>,
    surcharges: Mutex<Vec<SurchargeBand>>,
    documents: Mutex<Vec<ReturnDocument>>,
    failing_income: Mutex<HashSet<IncomeCategory>>,
    stalled_income: Mutex<HashSet<IncomeCategory>>,
    failing_sections: Mutex<HashSet<DeductionSection>>,
    stall_slabs: Mutex<bool>,
    fail_saves: Mutex<bool>,
}

impl MemoryRepository {
    /// Statutory data for AY 2025-26 only.
    pub fn seeded() -> Self {
        let repo = Self::default();
        repo.configs.lock().unwrap().insert(2025, config());
        repo.limits.lock().unwrap().insert(2025, limits());
        repo.slabs.lock().unwrap().extend(slabs());
        repo.surcharges.lock().unwrap().extend(surcharges());
        repo
    }

    pub fn with_profile(
        self,
        profile: PersonalProfile,
    ) -> Self {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.filer_id.clone(), profile);
        self
    }

    pub fn add_income(
        &self,
        category: IncomeCategory,
        subtype: &str,
        gross: Decimal,
        source_ref: &str,
    ) {
        self.income.lock().unwrap().push(IncomeRecord {
            filer_id: FILER.to_string(),
            financial_year: YEAR,
            category,
            subtype: subtype.to_string(),
            gross_amount: gross,
            allowable_expense: Decimal::ZERO,
            computed_net: None,
            source_ref: source_ref.to_string(),
        });
    }

    pub fn add_claim(
        &self,
        section: DeductionSection,
        amount: Decimal,
    ) {
        self.claims.lock().unwrap().push(DeductionClaim {
            filer_id: FILER.to_string(),
            financial_year: YEAR,
            section,
            claimed_amount: amount,
            evidence_ref: "receipt".to_string(),
            detail: ClaimDetail::None,
        });
    }

    pub fn add_tax_paid(
        &self,
        kind: TaxPaidKind,
        amount: Decimal,
    ) {
        self.tax_paid.lock().unwrap().push(TaxPaidRecord {
            filer_id: FILER.to_string(),
            financial_year: YEAR,
            kind,
            amount,
            reference: "challan".to_string(),
        });
    }

    pub fn fail_income(
        &self,
        category: IncomeCategory,
    ) {
        self.failing_income.lock().unwrap().insert(category);
    }

    pub fn stall_income(
        &self,
        category: IncomeCategory,
    ) {
        self.stalled_income.lock().unwrap().insert(category);
    }

    pub fn fail_section(
        &self,
        section: DeductionSection,
    ) {
        self.failing_sections.lock().unwrap().insert(section);
    }

    pub fn stall_slabs(&self) {
        *self.stall_slabs.lock().unwrap() = true;
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }

    /// Rewrites a stored payload without updating its checksum.
    pub fn tamper(
        &self,
        id: i64,
    ) {
        let mut documents = self.documents.lock().unwrap();
        if let Some(document) = documents.iter_mut().find(|d| d.id == id) {
            document.payload.push(' ');
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordSource for MemoryRepository {
    async fn fetch_income(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        category: IncomeCategory,
    ) -> Result<Vec<IncomeRecord>, RepositoryError> {
        if self.failing_income.lock().unwrap().contains(&category) {
            return Err(RepositoryError::Unavailable(format!("{category} service down")));
        }
        let stalled = self.stalled_income.lock().unwrap().contains(&category);
        if stalled {
            tokio::time::sleep(STALL).await;
        }
        Ok(self
            .income
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.filer_id == filer_id && r.financial_year == financial_year && r.category == category
            })
            .cloned()
            .collect())
    }

    async fn fetch_claims(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        section: DeductionSection,
    ) -> Result<Vec<DeductionClaim>, RepositoryError> {
        if self.failing_sections.lock().unwrap().contains(&section) {
            return Err(RepositoryError::Unavailable(format!("{section} service down")));
        }
        Ok(self
            .claims
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.filer_id == filer_id && c.financial_year == financial_year && c.section == section
            })
            .cloned()
            .collect())
    }

    async fn fetch_tax_paid(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        kind: TaxPaidKind,
    ) -> Result<Vec<TaxPaidRecord>, RepositoryError> {
        Ok(self
            .tax_paid
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.filer_id == filer_id && t.financial_year == financial_year && t.kind == kind)
            .cloned()
            .collect())
    }

    async fn fetch_profile(&self, filer_id: &str) -> Result<PersonalProfile, RepositoryError> {
        self.profiles
            .lock()
            .unwrap()
            .get(filer_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl StatutoryConfigSource for MemoryRepository {
    async fn get_assessment_year_config(
        &self,
        assessment_year: i32,
    ) -> Result<AssessmentYearConfig, RepositoryError> {
        self.configs
            .lock()
            .unwrap()
            .get(&assessment_year)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_assessment_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let mut years: Vec<i32> = self.configs.lock().unwrap().keys().copied().collect();
        years.sort();
        Ok(years)
    }

    async fn get_tax_slabs(
        &self,
        assessment_year: i32,
        regime: Regime,
        age_band: AgeBand,
    ) -> Result<Vec<TaxSlab>, RepositoryError> {
        let stalled = *self.stall_slabs.lock().unwrap();
        if stalled {
            tokio::time::sleep(STALL).await;
        }
        let mut slabs: Vec<TaxSlab> = self
            .slabs
            .lock()
            .unwrap()
            .iter()
            .filter(|s| {
                s.assessment_year == assessment_year && s.regime == regime && s.age_band == age_band
            })
            .cloned()
            .collect();
        slabs.sort_by(|a, b| a.min_income.cmp(&b.min_income));
        Ok(slabs)
    }

    async fn get_surcharge_bands(
        &self,
        assessment_year: i32,
        regime: Regime,
    ) -> Result<Vec<SurchargeBand>, RepositoryError> {
        Ok(self
            .surcharges
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.assessment_year == assessment_year && b.regime == regime)
            .cloned()
            .collect())
    }

    async fn get_deduction_limits(
        &self,
        assessment_year: i32,
    ) -> Result<DeductionLimits, RepositoryError> {
        self.limits
            .lock()
            .unwrap()
            .get(&assessment_year)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn insert_tax_slab(&self, slab: &TaxSlab) -> Result<(), RepositoryError> {
        self.slabs.lock().unwrap().push(slab.clone());
        Ok(())
    }

    async fn delete_tax_slabs(
        &self,
        assessment_year: i32,
        regime: Regime,
        age_band: AgeBand,
    ) -> Result<(), RepositoryError> {
        self.slabs.lock().unwrap().retain(|s| {
            !(s.assessment_year == assessment_year && s.regime == regime && s.age_band == age_band)
        });
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryRepository {
    async fn save_return_document(
        &self,
        document: NewReturnDocument,
    ) -> Result<ReturnDocument, RepositoryError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(RepositoryError::Database("disk full".to_string()));
        }
        let mut documents = self.documents.lock().unwrap();
        for existing in documents.iter_mut() {
            if existing.filer_id == document.filer_id
                && existing.financial_year == document.financial_year
                && existing.form_type == document.form_type
            {
                existing.status = DocumentStatus::Superseded;
            }
        }
        let saved = ReturnDocument {
            id: documents.len() as i64 + 1,
            filer_id: document.filer_id,
            financial_year: document.financial_year,
            assessment_year: document.assessment_year,
            form_type: document.form_type,
            schema_version: document.schema_version,
            payload: document.payload,
            checksum: document.checksum,
            generated_at: Utc::now(),
            status: DocumentStatus::Generated,
            warnings: document.warnings,
        };
        documents.push(saved.clone());
        Ok(saved)
    }

    async fn get_return_document(&self, id: i64) -> Result<ReturnDocument, RepositoryError> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn latest_return_document(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        form_type: FormType,
    ) -> Result<ReturnDocument, RepositoryError> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|d| {
                d.filer_id == filer_id
                    && d.financial_year == financial_year
                    && d.form_type == form_type
                    && d.status != DocumentStatus::Superseded
            })
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_return_documents(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Result<Vec<ReturnDocument>, RepositoryError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|d| d.filer_id == filer_id && d.financial_year == financial_year)
            .cloned()
            .collect())
    }

    async fn mark_downloaded(&self, id: i64) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(RepositoryError::NotFound)?;
        document.status = DocumentStatus::Downloaded;
        Ok(())
    }

    async fn mark_superseded(&self, id: i64) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .iter_mut()
            .find(|d| d.id == id && d.status != DocumentStatus::Superseded)
            .ok_or(RepositoryError::NotFound)?;
        document.status = DocumentStatus::Superseded;
        Ok(())
    }
}

pub fn profile(filer_id: &str) -> PersonalProfile {
    PersonalProfile {
        filer_id: filer_id.to_string(),
        first_name: "Asha".to_string(),
        middle_name: None,
        last_name: "Rao".to_string(),
        pan: "ABCDE1234F".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1988, 7, 14),
        email: "asha@example.in".to_string(),
        mobile: "9800000000".to_string(),
        address: Address {
            line: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state_code: "KA".to_string(),
            pin_code: "560001".to_string(),
            country_code: "IN".to_string(),
        },
        bank_account: BankAccount {
            ifsc: "HDFC0000123".to_string(),
            account_number: "001234567890".to_string(),
            bank_name: "HDFC Bank".to_string(),
        },
        company_director: false,
        business: None,
    }
}

pub fn config() -> AssessmentYearConfig {
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

pub fn limits() -> DeductionLimits {
    DeductionLimits {
        assessment_year: 2025,
        sec_80c_combined_ceiling: dec!(150000),
        sec_80c_cap: dec!(150000),
        sec_80ccc_cap: dec!(150000),
        sec_80ccd1_cap: dec!(150000),
        sec_80ccd1_salary_rate: dec!(0.10),
        sec_80ccd1_income_rate: dec!(0.20),
        sec_80ccd1b_cap: dec!(50000),
        sec_80ccd2_rate: dec!(0.10),
        sec_80d_self_cap: dec!(25000),
        sec_80d_self_senior_cap: dec!(50000),
        sec_80d_parents_cap: dec!(25000),
        sec_80d_parents_senior_cap: dec!(50000),
        sec_80dd_amount: dec!(75000),
        sec_80dd_severe_amount: dec!(125000),
        sec_80u_amount: dec!(75000),
        sec_80u_severe_amount: dec!(125000),
        sec_80gg_monthly_ceiling: dec!(5000),
        sec_80gg_income_rate: dec!(0.25),
        sec_80gg_rent_excess_rate: dec!(0.10),
        sec_80g_qualifying_rate: dec!(0.10),
        sec_80g_cash_limit: dec!(2000),
        sec_80eea_cap: dec!(150000),
        sec_80eeb_cap: dec!(150000),
        sec_80tta_cap: dec!(10000),
        sec_80ttb_cap: dec!(50000),
    }
}

fn slab(
    regime: Regime,
    age_band: AgeBand,
    min: Decimal,
    max: Option<Decimal>,
    rate: Decimal,
    base: Decimal,
) -> TaxSlab {
    TaxSlab {
        assessment_year: 2025,
        regime,
        age_band,
        min_income: min,
        max_income: max,
        tax_rate: rate,
        base_tax: base,
    }
}

/// FY 2024-25 slab tables for filers below 60.
pub fn slabs() -> Vec<TaxSlab> {
    let old = |min, max, rate, base| slab(Regime::Old, AgeBand::Below60, min, max, rate, base);
    let new = |min, max, rate, base| slab(Regime::New, AgeBand::Below60, min, max, rate, base);
    vec![
        old(dec!(0), Some(dec!(250000)), dec!(0), dec!(0)),
        old(dec!(250000), Some(dec!(500000)), dec!(0.05), dec!(0)),
        old(dec!(500000), Some(dec!(1000000)), dec!(0.20), dec!(12500)),
        old(dec!(1000000), None, dec!(0.30), dec!(112500)),
        new(dec!(0), Some(dec!(300000)), dec!(0), dec!(0)),
        new(dec!(300000), Some(dec!(700000)), dec!(0.05), dec!(0)),
        new(dec!(700000), Some(dec!(1000000)), dec!(0.10), dec!(20000)),
        new(dec!(1000000), Some(dec!(1200000)), dec!(0.15), dec!(50000)),
        new(dec!(1200000), Some(dec!(1500000)), dec!(0.20), dec!(80000)),
        new(dec!(1500000), None, dec!(0.30), dec!(140000)),
    ]
}

pub fn surcharges() -> Vec<SurchargeBand> {
    let band = |regime, min, rate| SurchargeBand {
        assessment_year: 2025,
        regime,
        min_income: min,
        rate,
    };
    vec![
        band(Regime::Old, dec!(5000000), dec!(0.10)),
        band(Regime::Old, dec!(10000000), dec!(0.15)),
        band(Regime::New, dec!(5000000), dec!(0.10)),
        band(Regime::New, dec!(10000000), dec!(0.15)),
    ]
}

/// Salaried filer earning 1,000,000 with a complete salary breakup and an
/// 80C claim above its cap.
pub fn salaried_filer() -> MemoryRepository {
    let repo = MemoryRepository::seeded().with_profile(profile(FILER));
    repo.add_income(IncomeCategory::Salary, "basic", dec!(600000), "EMP-1");
    repo.add_income(IncomeCategory::Salary, "dearness_allowance", dec!(100000), "EMP-1");
    repo.add_income(IncomeCategory::Salary, "employer_nps_contribution", dec!(50000), "EMP-1");
    repo.add_income(IncomeCategory::Salary, "special_allowance", dec!(250000), "EMP-1");
    repo.add_claim(DeductionSection::Sec80C, dec!(200000));
    repo.add_tax_paid(TaxPaidKind::Tds, dec!(60000));
    repo
}
