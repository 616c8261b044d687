use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DeductionSection, IncomeCategory, TaxPaidKind};

/// Non-fatal conditions collected during a computation and returned
/// alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComputationWarning {
    /// A claim exceeded its statutory cap and was clamped.
    CapApplied {
        section: DeductionSection,
        claimed: Decimal,
        allowed: Decimal,
    },
    /// A section does not apply to this filer and contributes zero.
    InapplicableSection {
        section: DeductionSection,
        reason: String,
    },
    /// A category collaborator failed or timed out; the category is excluded.
    IncompleteCategory {
        category: IncomeCategory,
        reason: String,
    },
    /// Claims for a section could not be read; the section contributes zero.
    IncompleteSection {
        section: DeductionSection,
        reason: String,
    },
    /// Tax-paid records of one kind could not be read.
    IncompleteTaxPaid { kind: TaxPaidKind, reason: String },
    /// A derived section lacks the records it is computed from.
    DataIncomplete {
        section: DeductionSection,
        missing: Vec<String>,
    },
}

impl fmt::Display for ComputationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapApplied {
                section,
                claimed,
                allowed,
            } => write!(f, "{section}: claimed {claimed} clamped to {allowed}"),
            Self::InapplicableSection { section, reason } => {
                write!(f, "{section}: not applicable ({reason})")
            }
            Self::IncompleteCategory { category, reason } => {
                write!(f, "income category {category} excluded: {reason}")
            }
            Self::IncompleteSection { section, reason } => {
                write!(f, "claims for {section} unavailable: {reason}")
            }
            Self::IncompleteTaxPaid { kind, reason } => {
                write!(f, "{kind} records unavailable: {reason}")
            }
            Self::DataIncomplete { section, missing } => {
                write!(f, "{section}: missing {}", missing.join(", "))
            }
        }
    }
}
