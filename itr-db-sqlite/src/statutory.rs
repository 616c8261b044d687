use async_trait::async_trait;
use itr_core::{
    AgeBand, AssessmentYearConfig, DeductionLimits, Regime, RepositoryError,
    StatutoryConfigSource, SurchargeBand, TaxSlab,
};
use sqlx::sqlite::SqliteRow;
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};
use crate::repository::{SqliteRepository, code, column, database};

fn row_to_config(row: &SqliteRow) -> Result<AssessmentYearConfig, RepositoryError> {
    Ok(AssessmentYearConfig {
        assessment_year: column(row, "assessment_year")?,
        schema_version: column(row, "schema_version")?,
        standard_deduction_old: get_decimal(row, "standard_deduction_old")?,
        standard_deduction_new: get_decimal(row, "standard_deduction_new")?,
        rebate_threshold_old: get_decimal(row, "rebate_threshold_old")?,
        rebate_max_old: get_decimal(row, "rebate_max_old")?,
        rebate_threshold_new: get_decimal(row, "rebate_threshold_new")?,
        rebate_max_new: get_decimal(row, "rebate_max_new")?,
        cess_rate: get_decimal(row, "cess_rate")?,
        form1_income_ceiling: get_decimal(row, "form1_income_ceiling")?,
        form4_income_ceiling: get_decimal(row, "form4_income_ceiling")?,
        senior_age: column(row, "senior_age")?,
        super_senior_age: column(row, "super_senior_age")?,
    })
}

fn row_to_slab(row: &SqliteRow) -> Result<TaxSlab, RepositoryError> {
    Ok(TaxSlab {
        assessment_year: column(row, "assessment_year")?,
        regime: code(row, "regime", Regime::parse)?,
        age_band: code(row, "age_band", AgeBand::parse)?,
        min_income: get_decimal(row, "min_income")?,
        max_income: get_optional_decimal(row, "max_income")?,
        tax_rate: get_decimal(row, "tax_rate")?,
        base_tax: get_decimal(row, "base_tax")?,
    })
}

fn row_to_surcharge(row: &SqliteRow) -> Result<SurchargeBand, RepositoryError> {
    Ok(SurchargeBand {
        assessment_year: column(row, "assessment_year")?,
        regime: code(row, "regime", Regime::parse)?,
        min_income: get_decimal(row, "min_income")?,
        rate: get_decimal(row, "rate")?,
    })
}

fn row_to_limits(row: &SqliteRow) -> Result<DeductionLimits, RepositoryError> {
    Ok(DeductionLimits {
        assessment_year: column(row, "assessment_year")?,
        sec_80c_combined_ceiling: get_decimal(row, "sec_80c_combined_ceiling")?,
        sec_80c_cap: get_decimal(row, "sec_80c_cap")?,
        sec_80ccc_cap: get_decimal(row, "sec_80ccc_cap")?,
        sec_80ccd1_cap: get_decimal(row, "sec_80ccd1_cap")?,
        sec_80ccd1_salary_rate: get_decimal(row, "sec_80ccd1_salary_rate")?,
        sec_80ccd1_income_rate: get_decimal(row, "sec_80ccd1_income_rate")?,
        sec_80ccd1b_cap: get_decimal(row, "sec_80ccd1b_cap")?,
        sec_80ccd2_rate: get_decimal(row, "sec_80ccd2_rate")?,
        sec_80d_self_cap: get_decimal(row, "sec_80d_self_cap")?,
        sec_80d_self_senior_cap: get_decimal(row, "sec_80d_self_senior_cap")?,
        sec_80d_parents_cap: get_decimal(row, "sec_80d_parents_cap")?,
        sec_80d_parents_senior_cap: get_decimal(row, "sec_80d_parents_senior_cap")?,
        sec_80dd_amount: get_decimal(row, "sec_80dd_amount")?,
        sec_80dd_severe_amount: get_decimal(row, "sec_80dd_severe_amount")?,
        sec_80u_amount: get_decimal(row, "sec_80u_amount")?,
        sec_80u_severe_amount: get_decimal(row, "sec_80u_severe_amount")?,
        sec_80gg_monthly_ceiling: get_decimal(row, "sec_80gg_monthly_ceiling")?,
        sec_80gg_income_rate: get_decimal(row, "sec_80gg_income_rate")?,
        sec_80gg_rent_excess_rate: get_decimal(row, "sec_80gg_rent_excess_rate")?,
        sec_80g_qualifying_rate: get_decimal(row, "sec_80g_qualifying_rate")?,
        sec_80g_cash_limit: get_decimal(row, "sec_80g_cash_limit")?,
        sec_80eea_cap: get_decimal(row, "sec_80eea_cap")?,
        sec_80eeb_cap: get_decimal(row, "sec_80eeb_cap")?,
        sec_80tta_cap: get_decimal(row, "sec_80tta_cap")?,
        sec_80ttb_cap: get_decimal(row, "sec_80ttb_cap")?,
    })
}

#[async_trait]
impl StatutoryConfigSource for SqliteRepository {
    async fn get_assessment_year_config(
        &self,
        assessment_year: i32,
    ) -> Result<AssessmentYearConfig, RepositoryError> {
        let row = sqlx::query("SELECT * FROM assessment_year_config WHERE assessment_year = ?")
            .bind(assessment_year)
            .fetch_optional(self.pool())
            .await
            .map_err(database)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_config(&row)
    }

    async fn list_assessment_years(&self) -> Result<Vec<i32>, RepositoryError> {
        sqlx::query_scalar(
            "SELECT assessment_year FROM assessment_year_config ORDER BY assessment_year",
        )
        .fetch_all(self.pool())
        .await
        .map_err(database)
    }

    // Amounts are TEXT, so ordering happens on the decoded decimals rather
    // than in SQL.
    async fn get_tax_slabs(
        &self,
        assessment_year: i32,
        regime: Regime,
        age_band: AgeBand,
    ) -> Result<Vec<TaxSlab>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT assessment_year, regime, age_band, min_income, max_income, tax_rate, base_tax
             FROM tax_slabs
             WHERE assessment_year = ? AND regime = ? AND age_band = ?",
        )
        .bind(assessment_year)
        .bind(regime.as_str())
        .bind(age_band.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(database)?;

        let mut slabs = rows
            .iter()
            .map(row_to_slab)
            .collect::<Result<Vec<_>, _>>()?;
        slabs.sort_by(|a, b| a.min_income.cmp(&b.min_income));

        debug!(assessment_year, %regime, age_band = age_band.as_str(), rows = slabs.len(), "loaded slabs");
        Ok(slabs)
    }

    async fn get_surcharge_bands(
        &self,
        assessment_year: i32,
        regime: Regime,
    ) -> Result<Vec<SurchargeBand>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT assessment_year, regime, min_income, rate
             FROM surcharge_bands
             WHERE assessment_year = ? AND regime = ?",
        )
        .bind(assessment_year)
        .bind(regime.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(database)?;

        let mut bands = rows
            .iter()
            .map(row_to_surcharge)
            .collect::<Result<Vec<_>, _>>()?;
        bands.sort_by(|a, b| a.min_income.cmp(&b.min_income));
        Ok(bands)
    }

    async fn get_deduction_limits(
        &self,
        assessment_year: i32,
    ) -> Result<DeductionLimits, RepositoryError> {
        let row = sqlx::query("SELECT * FROM deduction_limits WHERE assessment_year = ?")
            .bind(assessment_year)
            .fetch_optional(self.pool())
            .await
            .map_err(database)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_limits(&row)
    }

    async fn insert_tax_slab(&self, slab: &TaxSlab) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT OR REPLACE INTO tax_slabs
                (assessment_year, regime, age_band, min_income, max_income, tax_rate, base_tax)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(slab.assessment_year)
        .bind(slab.regime.as_str())
        .bind(slab.age_band.as_str())
        .bind(decimal_to_text(slab.min_income))
        .bind(slab.max_income.map(decimal_to_text))
        .bind(decimal_to_text(slab.tax_rate))
        .bind(decimal_to_text(slab.base_tax))
        .execute(self.pool())
        .await
        .map_err(database)?;

        Ok(())
    }

    async fn delete_tax_slabs(
        &self,
        assessment_year: i32,
        regime: Regime,
        age_band: AgeBand,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tax_slabs WHERE assessment_year = ? AND regime = ? AND age_band = ?")
            .bind(assessment_year)
            .bind(regime.as_str())
            .bind(age_band.as_str())
            .execute(self.pool())
            .await
            .map_err(database)?;

        Ok(())
    }
}
