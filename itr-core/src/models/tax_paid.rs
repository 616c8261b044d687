use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::FinancialYear;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxPaidKind {
    /// Tax deducted at source.
    Tds,
    /// Tax collected at source.
    Tcs,
    AdvanceTax,
    SelfAssessment,
}

impl TaxPaidKind {
    pub const ALL: [TaxPaidKind; 4] = [Self::Tds, Self::Tcs, Self::AdvanceTax, Self::SelfAssessment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tds => "TDS",
            Self::Tcs => "TCS",
            Self::AdvanceTax => "ADVANCE_TAX",
            Self::SelfAssessment => "SELF_ASSESSMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for TaxPaidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPaidRecord {
    pub filer_id: String,
    pub financial_year: FinancialYear,
    pub kind: TaxPaidKind,
    pub amount: Decimal,
    /// Challan or certificate reference, informational only.
    pub reference: String,
}
