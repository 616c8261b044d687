use std::path::PathBuf;

use async_trait::async_trait;
use itr_core::db::{DbConfig, RepositoryFactory};
use itr_core::{RepositoryError, TaxRepository};

use crate::repository::SqliteRepository;

/// Seeds directory, resolved at runtime.
///
/// 1. `ITR_DB_SQLITE_SEEDS_DIR` when set.
/// 2. `./seeds` when it exists in the working directory.
/// 3. `$CARGO_MANIFEST_DIR/seeds` (build tree, tests).
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ITR_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for the `"sqlite"` backend.
///
/// ```rust,no_run
/// use itr_core::db::RepositoryRegistry;
/// use itr_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens `config.connection_string` (a file path, created if missing,
    /// or `:memory:`), migrates it and applies the seed files.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TaxRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}
