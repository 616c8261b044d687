use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itr_core::{
    DocumentStatus, DocumentStore, FinancialYear, FormType, NewReturnDocument, RepositoryError,
    ReturnDocument,
};
use sqlx::sqlite::SqliteRow;
use tracing::info;

use crate::repository::{SqliteRepository, code, column, database, json};

const SELECT_DOCUMENT: &str = "SELECT id, filer_id, financial_year, assessment_year, form_type,
        schema_version, payload, checksum, generated_at, status, warnings
    FROM return_documents";

fn row_to_document(row: &SqliteRow) -> Result<ReturnDocument, RepositoryError> {
    Ok(ReturnDocument {
        id: column(row, "id")?,
        filer_id: column(row, "filer_id")?,
        financial_year: FinancialYear(column(row, "financial_year")?),
        assessment_year: column(row, "assessment_year")?,
        form_type: code(row, "form_type", FormType::parse)?,
        schema_version: column(row, "schema_version")?,
        payload: column(row, "payload")?,
        checksum: column(row, "checksum")?,
        generated_at: column::<DateTime<Utc>>(row, "generated_at")?,
        status: code(row, "status", DocumentStatus::parse)?,
        warnings: json(row, "warnings")?,
    })
}

#[async_trait]
impl DocumentStore for SqliteRepository {
    async fn save_return_document(
        &self,
        document: NewReturnDocument,
    ) -> Result<ReturnDocument, RepositoryError> {
        let warnings = serde_json::to_string(&document.warnings)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut tx = self.pool().begin().await.map_err(database)?;

        let superseded = sqlx::query(
            "UPDATE return_documents SET status = 'SUPERSEDED'
             WHERE filer_id = ? AND financial_year = ? AND form_type = ?
               AND status != 'SUPERSEDED'",
        )
        .bind(&document.filer_id)
        .bind(document.financial_year.start_year())
        .bind(document.form_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(database)?
        .rows_affected();

        let id = sqlx::query(
            "INSERT INTO return_documents (
                filer_id, financial_year, assessment_year, form_type, schema_version,
                payload, checksum, generated_at, status, warnings
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'GENERATED', ?)",
        )
        .bind(&document.filer_id)
        .bind(document.financial_year.start_year())
        .bind(document.assessment_year)
        .bind(document.form_type.as_str())
        .bind(&document.schema_version)
        .bind(&document.payload)
        .bind(&document.checksum)
        .bind(Utc::now())
        .bind(warnings)
        .execute(&mut *tx)
        .await
        .map_err(database)?
        .last_insert_rowid();

        tx.commit().await.map_err(database)?;

        info!(
            id,
            filer_id = %document.filer_id,
            form = %document.form_type,
            superseded,
            "saved return document"
        );
        self.get_return_document(id).await
    }

    async fn get_return_document(&self, id: i64) -> Result<ReturnDocument, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_DOCUMENT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(database)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_document(&row)
    }

    async fn latest_return_document(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
        form_type: FormType,
    ) -> Result<ReturnDocument, RepositoryError> {
        let row = sqlx::query(&format!(
            "{SELECT_DOCUMENT}
             WHERE filer_id = ? AND financial_year = ? AND form_type = ?
               AND status != 'SUPERSEDED'
             ORDER BY id DESC
             LIMIT 1"
        ))
        .bind(filer_id)
        .bind(financial_year.start_year())
        .bind(form_type.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(database)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_document(&row)
    }

    async fn list_return_documents(
        &self,
        filer_id: &str,
        financial_year: FinancialYear,
    ) -> Result<Vec<ReturnDocument>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_DOCUMENT}
             WHERE filer_id = ? AND financial_year = ?
             ORDER BY id DESC"
        ))
        .bind(filer_id)
        .bind(financial_year.start_year())
        .fetch_all(self.pool())
        .await
        .map_err(database)?;

        rows.iter().map(row_to_document).collect()
    }

    async fn mark_downloaded(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE return_documents SET status = 'DOWNLOADED'
             WHERE id = ? AND status != 'SUPERSEDED'",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(database)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_superseded(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE return_documents SET status = 'SUPERSEDED'
             WHERE id = ? AND status != 'SUPERSEDED'",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(database)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
