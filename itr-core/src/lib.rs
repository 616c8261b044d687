pub mod calculations;
pub mod db;
pub mod document;
pub mod engine;
pub mod error;
pub mod models;
pub mod settings;

pub use db::{
    DocumentStore, RecordSource, RepositoryError, StatutoryConfigSource, TaxRepository,
};
pub use engine::{ComputationOutcome, GenerateRequest, GenerationOutcome, TaxEngine};
pub use error::EngineError;
pub use models::*;
pub use settings::EngineSettings;
