use async_trait::async_trait;
use chrono::NaiveDate;
use itr_core::{
    Address, BalanceSheet, BankAccount, BusinessProfile, DeductionClaim, DeductionSection,
    FinancialYear, IncomeCategory, IncomeRecord, PersonalProfile, RecordSource, RepositoryError,
    TaxPaidKind, TaxPaidRecord,
};
use sqlx::sqlite::SqliteRow;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};
use crate::repository::{SqliteRepository, column, code, database, json};

fn row_to_income_record(row: &SqliteRow) -> Result<IncomeRecord, RepositoryError> {
    Ok(IncomeRecord {
        filer_id: column(row, "filer_id")?,
        financial_year: FinancialYear(column(row, "financial_year")?),
        category: code(row, "category", IncomeCategory::parse)?,
        subtype: column(row, "subtype")?,
        gross_amount: get_decimal(row, "gross_amount")?,
        allowable_expense: get_decimal(row, "allowable_expense")?,
        computed_net: get_optional_decimal(row, "computed_net")?,
        source_ref: column(row, "source_ref")?,
    })
}

fn row_to_claim(row: &SqliteRow) -> Result<DeductionClaim, RepositoryError> {
    Ok(DeductionClaim {
        filer_id: column(row, "filer_id")?,
        financial_year: FinancialYear(column(row, "financial_year")?),
        section: code(row, "section", DeductionSection::parse)?,
        claimed_amount: get_decimal(row, "claimed_amount")?,
        evidence_ref: column(row, "evidence_ref")?,
        detail: json(row, "detail")?,
    })
}

fn row_to_tax_paid(row: &SqliteRow) -> Result<TaxPaidRecord, RepositoryError> {
    Ok(TaxPaidRecord {
        filer_id: column(row, "filer_id")?,
        financial_year: FinancialYear(column(row, "financial_year")?),
        kind: code(row, "kind", TaxPaidKind::parse)?,
        amount: get_decimal(row, "amount")?,
        reference: column(row, "reference")?,
    })
}

fn row_to_profile(row: &SqliteRow) -> Result<PersonalProfile, RepositoryError> {
    let trade_name: Option<String> = column(row, "trade_name")?;
    let business = match trade_name {
        Some(trade_name) => {
            let total_assets = get_optional_decimal(row, "total_assets")?;
            let balance_sheet = match total_assets {
                Some(total_assets) => Some(BalanceSheet {
                    total_assets,
                    total_liabilities: get_decimal(row, "total_liabilities")?,
                    proprietor_capital: get_decimal(row, "proprietor_capital")?,
                }),
                None => None,
            };
            Some(BusinessProfile {
                trade_name,
                nature_of_business_code: column::<Option<String>>(row, "nature_of_business_code")?
                    .unwrap_or_default(),
                balance_sheet,
            })
        }
        None => None,
    };

    Ok(PersonalProfile {
        filer_id: column(row, "filer_id")?,
        first_name: column(row, "first_name")?,
        middle_name: column(row, "middle_name")?,
        last_name: column(row, "last_name")?,
        pan: column(row, "pan")?,
        date_of_birth: column::<Option<NaiveDate>>(row, "date_of_birth")?,
        email: column(row, "email")?,
        mobile: column(row, "mobile")?,
        address: Address {
            line: column(row, "address_line")?,
            city: column(row, "city")?,
            state_code: column(row, "state_code")?,
            pin_code: column(row, "pin_code")?,
            country_code: column(row, "country_code")?,
        },
        bank_account: BankAccount {
            ifsc: column(row, "ifsc")?,
            account_number: column(row, "account_number")?,
            bank_name: column(row, "bank_name")?,
        },
        company_director: column(row, "company_director")?,
        business,
    })
}

#[async_trait]
impl RecordSource for SqliteRepository {
    async fn fetch_income(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        category: IncomeCategory,
    ) -> Result<Vec<IncomeRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT filer_id, financial_year, category, subtype, gross_amount,
                    allowable_expense, computed_net, source_ref
             FROM income_records
             WHERE filer_id = ? AND financial_year = ? AND category = ?
             ORDER BY id",
        )
        .bind(filer_id)
        .bind(financial_year.start_year())
        .bind(category.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(database)?;

        rows.iter().map(row_to_income_record).collect()
    }

    async fn fetch_claims(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        section: DeductionSection,
    ) -> Result<Vec<DeductionClaim>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT filer_id, financial_year, section, claimed_amount, evidence_ref, detail
             FROM deduction_claims
             WHERE filer_id = ? AND financial_year = ? AND section = ?
             ORDER BY id",
        )
        .bind(filer_id)
        .bind(financial_year.start_year())
        .bind(section.code())
        .fetch_all(self.pool())
        .await
        .map_err(database)?;

        rows.iter().map(row_to_claim).collect()
    }

    async fn fetch_tax_paid(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        kind: TaxPaidKind,
    ) -> Result<Vec<TaxPaidRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT filer_id, financial_year, kind, amount, reference
             FROM tax_paid_records
             WHERE filer_id = ? AND financial_year = ? AND kind = ?
             ORDER BY id",
        )
        .bind(filer_id)
        .bind(financial_year.start_year())
        .bind(kind.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(database)?;

        rows.iter().map(row_to_tax_paid).collect()
    }

    async fn fetch_profile(&self, filer_id: &str) -> Result<PersonalProfile, RepositoryError> {
        let row = sqlx::query("SELECT * FROM filer_profiles WHERE filer_id = ?")
            .bind(filer_id)
            .fetch_optional(self.pool())
            .await
            .map_err(database)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_profile(&row)
    }
}

/// Write side of the capture tables. The engine never calls these; they
/// exist for importers and tests.
impl SqliteRepository {
    /// Inserts or replaces a filer profile.
    pub async fn save_profile(
        &self,
        profile: &PersonalProfile,
    ) -> Result<(), RepositoryError> {
        let business = profile.business.as_ref();
        let balance_sheet = business.and_then(|b| b.balance_sheet.as_ref());

        sqlx::query(
            "INSERT OR REPLACE INTO filer_profiles (
                filer_id, first_name, middle_name, last_name, pan, date_of_birth,
                email, mobile, address_line, city, state_code, pin_code, country_code,
                ifsc, account_number, bank_name, company_director,
                trade_name, nature_of_business_code,
                total_assets, total_liabilities, proprietor_capital
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&profile.filer_id)
        .bind(&profile.first_name)
        .bind(&profile.middle_name)
        .bind(&profile.last_name)
        .bind(&profile.pan)
        .bind(profile.date_of_birth)
        .bind(&profile.email)
        .bind(&profile.mobile)
        .bind(&profile.address.line)
        .bind(&profile.address.city)
        .bind(&profile.address.state_code)
        .bind(&profile.address.pin_code)
        .bind(&profile.address.country_code)
        .bind(&profile.bank_account.ifsc)
        .bind(&profile.bank_account.account_number)
        .bind(&profile.bank_account.bank_name)
        .bind(profile.company_director)
        .bind(business.map(|b| b.trade_name.clone()))
        .bind(business.map(|b| b.nature_of_business_code.clone()))
        .bind(balance_sheet.map(|s| decimal_to_text(s.total_assets)))
        .bind(balance_sheet.map(|s| decimal_to_text(s.total_liabilities)))
        .bind(balance_sheet.map(|s| decimal_to_text(s.proprietor_capital)))
        .execute(self.pool())
        .await
        .map_err(database)?;

        Ok(())
    }

    pub async fn insert_income_record(
        &self,
        record: &IncomeRecord,
    ) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO income_records (
                filer_id, financial_year, category, subtype, gross_amount,
                allowable_expense, computed_net, source_ref
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.filer_id)
        .bind(record.financial_year.start_year())
        .bind(record.category.as_str())
        .bind(&record.subtype)
        .bind(decimal_to_text(record.gross_amount))
        .bind(decimal_to_text(record.allowable_expense))
        .bind(record.computed_net.map(decimal_to_text))
        .bind(&record.source_ref)
        .execute(self.pool())
        .await
        .map_err(database)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_deduction_claim(
        &self,
        claim: &DeductionClaim,
    ) -> Result<i64, RepositoryError> {
        let detail = serde_json::to_string(&claim.detail)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO deduction_claims (
                filer_id, financial_year, section, claimed_amount, evidence_ref, detail
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&claim.filer_id)
        .bind(claim.financial_year.start_year())
        .bind(claim.section.code())
        .bind(decimal_to_text(claim.claimed_amount))
        .bind(&claim.evidence_ref)
        .bind(detail)
        .execute(self.pool())
        .await
        .map_err(database)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_tax_paid_record(
        &self,
        record: &TaxPaidRecord,
    ) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO tax_paid_records (filer_id, financial_year, kind, amount, reference)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.filer_id)
        .bind(record.financial_year.start_year())
        .bind(record.kind.as_str())
        .bind(decimal_to_text(record.amount))
        .bind(&record.reference)
        .execute(self.pool())
        .await
        .map_err(database)?;

        Ok(result.last_insert_rowid())
    }
}
