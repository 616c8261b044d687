use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use itr_core::RepositoryError;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Decode, Row, Type};
use tracing::{debug, info};

/// SQLite-backed implementation of every `itr-core` repository trait.
///
/// The trait impls live next to the tables they read: `records` for the
/// collaborator read contract, `statutory` for per-year configuration and
/// `documents` for generated returns.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens (creating if needed) the database at `database_url`.
    ///
    /// Accepts a bare path (`itr.db`), a sqlx URL (`sqlite://itr.db`) or
    /// `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid SQLite connection string: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {database_url}"))?;

        debug!(database_url, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Executes every `*.sql` file in `seeds_dir`, in filename order.
    /// Seed files must be idempotent; they run on every start.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in &entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
        }

        info!(files = entries.len(), dir = %seeds_dir.display(), "applied seed files");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn database(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

/// Typed column read with the error mapped into the repository taxonomy.
pub(crate) fn column<'r, T>(
    row: &'r SqliteRow,
    name: &str,
) -> Result<T, RepositoryError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Database(e.to_string()))
}

/// Reads a TEXT code column and parses it with one of the model `parse` fns.
pub(crate) fn code<T>(
    row: &SqliteRow,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, RepositoryError> {
    let raw: String = column(row, name)?;
    parse(&raw)
        .ok_or_else(|| RepositoryError::Database(format!("Unknown code '{raw}' in column '{name}'")))
}

/// Reads a JSON column into `T`.
pub(crate) fn json<T: serde::de::DeserializeOwned>(
    row: &SqliteRow,
    name: &str,
) -> Result<T, RepositoryError> {
    let raw: String = column(row, name)?;
    serde_json::from_str(&raw)
        .map_err(|e| RepositoryError::Database(format!("Malformed JSON in column '{name}': {e}")))
}
