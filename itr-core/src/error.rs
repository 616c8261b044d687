use thiserror::Error;

use crate::calculations::RegimeComputationError;
use crate::db::RepositoryError;
use crate::models::FormType;

/// Fatal outcomes of a computation or generation request.
///
/// Non-fatal conditions are reported as
/// [`ComputationWarning`](crate::models::ComputationWarning)s instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Identity fields the return cannot be filed without.
    #[error("missing required data: {}", fields.join(", "))]
    MissingData { fields: Vec<String> },

    #[error("{form} payload violates its schema: {}", violations.join("; "))]
    SchemaValidation {
        form: FormType,
        violations: Vec<String>,
    },

    /// Saving or updating a return document failed. Retryable.
    #[error("failed to persist return document: {0}")]
    Persistence(RepositoryError),

    /// The request did not finish within its deadline. Retryable.
    #[error("request timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// Statutory configuration, profile or document lookup failed.
    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error("calculation error: {0}")]
    Calculation(#[from] RegimeComputationError),

    #[error("checksum mismatch for document {id}: stored {stored}, computed {computed}")]
    Integrity {
        id: i64,
        stored: String,
        computed: String,
    },

    #[error("document {0} has been superseded by a newer return")]
    DocumentSuperseded(i64),

    #[error("assessment year {0} is not supported")]
    UnsupportedAssessmentYear(i32),

    /// A payload could not be serialized or an amount was out of range.
    #[error("document encoding error: {0}")]
    Encoding(String),
}

impl EngineError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn only_timeout_and_persistence_are_retryable() {
        assert!(EngineError::Timeout { elapsed_ms: 30000 }.is_retryable());
        assert!(EngineError::Persistence(RepositoryError::Database("locked".into())).is_retryable());
        assert!(!EngineError::Repository(RepositoryError::NotFound).is_retryable());
        assert!(!EngineError::MissingData { fields: vec![] }.is_retryable());
        assert!(!EngineError::DocumentSuperseded(3).is_retryable());
    }

    #[test]
    fn missing_data_lists_every_field() {
        let err = EngineError::MissingData {
            fields: vec!["profile.pan".to_string(), "profile.date_of_birth".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "missing required data: profile.pan, profile.date_of_birth"
        );
    }
}
