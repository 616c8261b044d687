use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::repository::{RepositoryError, TaxRepository};

/// Backend-agnostic connection configuration.
///
/// `backend` selects a registered [`RepositoryFactory`]; `connection_string`
/// is handed to that factory untouched.
///
/// | backend  | connection_string examples |
/// |----------|----------------------------|
/// | `sqlite` | `itr.db`, `:memory:`       |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "itr.db".to_string(),
        }
    }
}

/// One implementation per storage backend, registered at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Opens the backend and returns a repository ready for the engine.
    /// Migrations and seeding happen here.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn TaxRepository>, RepositoryError>;
}

/// Factories keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory, replacing any previous one with the same name.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatches `config` to the factory registered for `config.backend`.
    ///
    /// # Errors
    /// [`RepositoryError::Configuration`] when no such backend is registered,
    /// otherwise whatever the factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TaxRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::repository::{DocumentStore, RecordSource, StatutoryConfigSource};
    use crate::models::{
        AgeBand, AssessmentYearConfig, DeductionClaim, DeductionLimits, DeductionSection,
        FinancialYear, FormType, IncomeCategory, IncomeRecord, NewReturnDocument,
        PersonalProfile, Regime, ReturnDocument, SurchargeBand, TaxPaidKind, TaxPaidRecord,
        TaxSlab,
    };

    // Only routing is under test; no repository method is ever called.
    struct StubRepository;

    #[async_trait]
    impl RecordSource for StubRepository {
        async fn fetch_income(
            &self,
            _filer_id: &str,
            _financial_year: FinancialYear,
            _category: IncomeCategory,
        ) -> Result<Vec<IncomeRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn fetch_claims(
            &self,
            _filer_id: &str,
            _financial_year: FinancialYear,
            _section: DeductionSection,
        ) -> Result<Vec<DeductionClaim>, RepositoryError> {
            unimplemented!()
        }
        async fn fetch_tax_paid(
            &self,
            _filer_id: &str,
            _financial_year: FinancialYear,
            _kind: TaxPaidKind,
        ) -> Result<Vec<TaxPaidRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn fetch_profile(&self, _filer_id: &str) -> Result<PersonalProfile, RepositoryError> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl StatutoryConfigSource for StubRepository {
        async fn get_assessment_year_config(
            &self,
            _assessment_year: i32,
        ) -> Result<AssessmentYearConfig, RepositoryError> {
            unimplemented!()
        }
        async fn list_assessment_years(&self) -> Result<Vec<i32>, RepositoryError> {
            unimplemented!()
        }
        async fn get_tax_slabs(
            &self,
            _assessment_year: i32,
            _regime: Regime,
            _age_band: AgeBand,
        ) -> Result<Vec<TaxSlab>, RepositoryError> {
            unimplemented!()
        }
        async fn get_surcharge_bands(
            &self,
            _assessment_year: i32,
            _regime: Regime,
        ) -> Result<Vec<SurchargeBand>, RepositoryError> {
            unimplemented!()
        }
        async fn get_deduction_limits(
            &self,
            _assessment_year: i32,
        ) -> Result<DeductionLimits, RepositoryError> {
            unimplemented!()
        }
        async fn insert_tax_slab(&self, _slab: &TaxSlab) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn delete_tax_slabs(
            &self,
            _assessment_year: i32,
            _regime: Regime,
            _age_band: AgeBand,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl DocumentStore for StubRepository {
        async fn save_return_document(
            &self,
            _document: NewReturnDocument,
        ) -> Result<ReturnDocument, RepositoryError> {
            unimplemented!()
        }
        async fn get_return_document(&self, _id: i64) -> Result<ReturnDocument, RepositoryError> {
            unimplemented!()
        }
        async fn latest_return_document(
            &self,
            _filer_id: &str,
            _financial_year: FinancialYear,
            _form_type: FormType,
        ) -> Result<ReturnDocument, RepositoryError> {
            unimplemented!()
        }
        async fn list_return_documents(
            &self,
            _filer_id: &str,
            _financial_year: FinancialYear,
        ) -> Result<Vec<ReturnDocument>, RepositoryError> {
            unimplemented!()
        }
        async fn mark_downloaded(&self, _id: i64) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn mark_superseded(&self, _id: i64) -> Result<(), RepositoryError> {
            unimplemented!()
        }
    }

    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn TaxRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn TaxRepository>, RepositoryError> {
            Err(RepositoryError::Connection("refused".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    // ===== DbConfig tests =====

    #[test]
    fn dbconfig_default_is_sqlite_file() {
        let cfg = DbConfig::default();

        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, "itr.db");
    }

    #[test]
    fn dbconfig_deserializes_with_partial_fields() {
        let cfg: DbConfig = serde_json::from_str(r#"{"connection_string":"x.db"}"#).unwrap();

        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, "x.db");
    }

    // ===== registry tests =====

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RepositoryRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("postgres");
        reg.register(f1);
        reg.register(f2);

        assert_eq!(reg.available_backends(), vec!["postgres", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = RepositoryRegistry::default();
        let (old, _) = stub_factory("sqlite");
        let (new, _) = stub_factory("sqlite");
        reg.register(old);
        reg.register(new);

        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn create_calls_matching_factory_only() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = stub_factory("sqlite");
        let (postgres, postgres_called) = stub_factory("postgres");
        reg.register(sqlite);
        reg.register(postgres);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!postgres_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut reg = RepositoryRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("sqlite"));
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let err = reg.create(&config("failing")).await.err();

        assert_eq!(err, Some(RepositoryError::Connection("refused".to_string())));
    }
}
