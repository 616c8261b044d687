use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::FinancialYear;

/// Deduction section codes. Ordering follows the statute so that ledgers and
/// payloads list sections in a stable, familiar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeductionSection {
    /// Standard deduction against salary, s.16(ia).
    Standard,
    Sec80C,
    Sec80CCC,
    Sec80CCD1,
    Sec80CCD1B,
    Sec80CCD2,
    Sec80D,
    Sec80DD,
    Sec80E,
    Sec80EEA,
    Sec80EEB,
    Sec80G,
    Sec80GG,
    Sec80GGA,
    Sec80GGC,
    Sec80TTA,
    Sec80TTB,
    Sec80U,
}

impl DeductionSection {
    pub const ALL: [DeductionSection; 18] = [
        Self::Standard,
        Self::Sec80C,
        Self::Sec80CCC,
        Self::Sec80CCD1,
        Self::Sec80CCD1B,
        Self::Sec80CCD2,
        Self::Sec80D,
        Self::Sec80DD,
        Self::Sec80E,
        Self::Sec80EEA,
        Self::Sec80EEB,
        Self::Sec80G,
        Self::Sec80GG,
        Self::Sec80GGA,
        Self::Sec80GGC,
        Self::Sec80TTA,
        Self::Sec80TTB,
        Self::Sec80U,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Standard => "16ia",
            Self::Sec80C => "80C",
            Self::Sec80CCC => "80CCC",
            Self::Sec80CCD1 => "80CCD1",
            Self::Sec80CCD1B => "80CCD1B",
            Self::Sec80CCD2 => "80CCD2",
            Self::Sec80D => "80D",
            Self::Sec80DD => "80DD",
            Self::Sec80E => "80E",
            Self::Sec80EEA => "80EEA",
            Self::Sec80EEB => "80EEB",
            Self::Sec80G => "80G",
            Self::Sec80GG => "80GG",
            Self::Sec80GGA => "80GGA",
            Self::Sec80GGC => "80GGC",
            Self::Sec80TTA => "80TTA",
            Self::Sec80TTB => "80TTB",
            Self::Sec80U => "80U",
        }
    }

    /// Parses a section code, tolerating the bracketed form (`80CCD(2)`).
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|section| section.code().to_ascii_uppercase() == normalized)
    }

    /// Sections whose claims are read from the capture collaborators.
    /// The standard deduction and 80CCD(2) are derived, not claimed.
    pub fn claimable() -> impl Iterator<Item = DeductionSection> {
        Self::ALL
            .into_iter()
            .filter(|s| !matches!(s, Self::Standard | Self::Sec80CCD2))
    }
}

impl fmt::Display for DeductionSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsuredGroup {
    SelfAndFamily,
    Parents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisabilitySeverity {
    /// Severe disability (80% or more).
    Severe,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonationCategory {
    FullNoLimit,
    HalfNoLimit,
    FullWithLimit,
    HalfWithLimit,
}

impl DonationCategory {
    pub fn is_qualifying_limited(&self) -> bool {
        matches!(self, Self::FullWithLimit | Self::HalfWithLimit)
    }

    pub fn eligible_share(&self) -> Decimal {
        match self {
            Self::FullNoLimit | Self::FullWithLimit => Decimal::ONE,
            Self::HalfNoLimit | Self::HalfWithLimit => Decimal::new(5, 1),
        }
    }
}

/// Section-specific qualifier attached to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimDetail {
    #[default]
    None,
    MedicalInsurance {
        group: InsuredGroup,
        includes_senior: bool,
    },
    Disability {
        severity: DisabilitySeverity,
    },
    Donation {
        category: DonationCategory,
        paid_in_cash: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionClaim {
    pub filer_id: String,
    pub financial_year: FinancialYear,
    pub section: DeductionSection,
    pub claimed_amount: Decimal,
    pub evidence_ref: String,
    #[serde(default)]
    pub detail: ClaimDetail,
}
