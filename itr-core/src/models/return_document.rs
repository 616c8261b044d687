use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ComputationWarning, FinancialYear};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormType {
    Itr1,
    Itr2,
    Itr3,
    Itr4,
}

impl FormType {
    pub const ALL: [FormType; 4] = [Self::Itr1, Self::Itr2, Self::Itr3, Self::Itr4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Itr1 => "ITR1",
            Self::Itr2 => "ITR2",
            Self::Itr3 => "ITR3",
            Self::Itr4 => "ITR4",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().replace('-', "").to_ascii_uppercase();
        Self::ALL.into_iter().find(|f| f.as_str() == normalized)
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    Generated,
    Downloaded,
    Superseded,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "GENERATED",
            Self::Downloaded => "DOWNLOADED",
            Self::Superseded => "SUPERSEDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GENERATED" => Some(Self::Generated),
            "DOWNLOADED" => Some(Self::Downloaded),
            "SUPERSEDED" => Some(Self::Superseded),
            _ => None,
        }
    }
}

/// A persisted return document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnDocument {
    pub id: i64,
    pub filer_id: String,
    pub financial_year: FinancialYear,
    pub assessment_year: i32,
    pub form_type: FormType,
    pub schema_version: String,
    /// Canonical JSON serialization of the payload.
    pub payload: String,
    /// Hex SHA-256 of `payload`.
    pub checksum: String,
    pub generated_at: DateTime<Utc>,
    pub status: DocumentStatus,
    pub warnings: Vec<ComputationWarning>,
}

impl ReturnDocument {
    pub fn generated_with_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// For saving new documents (no id, status or timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReturnDocument {
    pub filer_id: String,
    pub financial_year: FinancialYear,
    pub assessment_year: i32,
    pub form_type: FormType,
    pub schema_version: String,
    pub payload: String,
    pub checksum: String,
    pub warnings: Vec<ComputationWarning>,
}
