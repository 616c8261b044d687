//! Return document assembly, schema validation, canonical serialization
//! and checksums.

pub mod builder;
pub mod canonical;
pub mod checksum;
pub mod generator;
pub mod schema;

pub use builder::{ReturnInputs, build_payload};
pub use canonical::to_canonical_string;
pub use checksum::ContentChecksum;
pub use generator::ReturnDocumentGenerator;
pub use schema::{FieldKind, FieldRule, FormSchema, SchemaCatalog};
