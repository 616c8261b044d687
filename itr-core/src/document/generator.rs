use tracing::{debug, warn};

use crate::error::EngineError;
use crate::models::{NewReturnDocument, ReturnDocument};

use super::builder::{ReturnInputs, build_payload};
use super::canonical::to_canonical_string;
use super::checksum::ContentChecksum;
use super::schema::SchemaCatalog;

/// Turns computed results into a validated, checksummed return document.
#[derive(Debug, Clone, Default)]
pub struct ReturnDocumentGenerator {
    catalog: SchemaCatalog,
}

impl ReturnDocumentGenerator {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Builds, validates and checksums a document without persisting it.
    ///
    /// # Errors
    /// * [`EngineError::MissingData`] listing every missing identity field.
    /// * [`EngineError::UnsupportedAssessmentYear`] when no schema exists for
    ///   the configured version.
    /// * [`EngineError::SchemaValidation`] listing every violation.
    pub fn prepare(
        &self,
        inputs: &ReturnInputs<'_>,
    ) -> Result<NewReturnDocument, EngineError> {
        let missing = inputs.profile.missing_identity_fields();
        if !missing.is_empty() {
            return Err(EngineError::MissingData { fields: missing });
        }

        let assessment_year = inputs.financial_year.assessment_year();
        let schema = self
            .catalog
            .schema(&inputs.config.schema_version, inputs.form_type)
            .ok_or(EngineError::UnsupportedAssessmentYear(assessment_year))?;

        let payload = build_payload(inputs)?;
        let violations = schema.validate(&payload);
        if !violations.is_empty() {
            warn!(form = %inputs.form_type, count = violations.len(), "payload failed schema validation");
            return Err(EngineError::SchemaValidation {
                form: inputs.form_type,
                violations,
            });
        }

        let canonical =
            to_canonical_string(&payload).map_err(|e| EngineError::Encoding(e.to_string()))?;
        let checksum = ContentChecksum::of(&canonical);
        debug!(form = %inputs.form_type, %checksum, bytes = canonical.len(), "payload serialized");

        Ok(NewReturnDocument {
            filer_id: inputs.profile.filer_id.clone(),
            financial_year: inputs.financial_year,
            assessment_year,
            form_type: inputs.form_type,
            schema_version: schema.version.clone(),
            payload: canonical,
            checksum: checksum.into_string(),
            warnings: inputs.warnings.to_vec(),
        })
    }

    /// Recomputes the checksum of a stored document.
    pub fn verify(document: &ReturnDocument) -> Result<(), EngineError> {
        let computed = ContentChecksum::of(&document.payload);
        if computed.matches(&document.checksum) {
            Ok(())
        } else {
            Err(EngineError::Integrity {
                id: document.id,
                stored: document.checksum.clone(),
                computed: computed.into_string(),
            })
        }
    }
}
