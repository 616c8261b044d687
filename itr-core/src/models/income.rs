use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::FinancialYear;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeCategory {
    Salary,
    HouseProperty,
    CapitalGainsShort,
    CapitalGainsLong,
    Business,
    Profession,
    Dividend,
    Interest,
    VirtualDigitalAsset,
    ForeignAsset,
    OtherSources,
}

impl IncomeCategory {
    pub const ALL: [IncomeCategory; 11] = [
        Self::Salary,
        Self::HouseProperty,
        Self::CapitalGainsShort,
        Self::CapitalGainsLong,
        Self::Business,
        Self::Profession,
        Self::Dividend,
        Self::Interest,
        Self::VirtualDigitalAsset,
        Self::ForeignAsset,
        Self::OtherSources,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salary => "SALARY",
            Self::HouseProperty => "HOUSE_PROPERTY",
            Self::CapitalGainsShort => "CAPITAL_GAINS_SHORT",
            Self::CapitalGainsLong => "CAPITAL_GAINS_LONG",
            Self::Business => "BUSINESS",
            Self::Profession => "PROFESSION",
            Self::Dividend => "DIVIDEND",
            Self::Interest => "INTEREST",
            Self::VirtualDigitalAsset => "VIRTUAL_DIGITAL_ASSET",
            Self::ForeignAsset => "FOREIGN_ASSET",
            Self::OtherSources => "OTHER_SOURCES",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn is_capital_gain(&self) -> bool {
        matches!(self, Self::CapitalGainsShort | Self::CapitalGainsLong)
    }

    pub fn is_business_or_profession(&self) -> bool {
        matches!(self, Self::Business | Self::Profession)
    }
}

impl fmt::Display for IncomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Salary-breakup tag carried in the `subtype` of a salary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalaryComponent {
    Basic,
    DearnessAllowance,
    HouseRentAllowance,
    EmployerNpsContribution,
    Other,
}

impl SalaryComponent {
    pub fn from_subtype(subtype: &str) -> Self {
        match subtype.trim().to_ascii_lowercase().as_str() {
            "basic" => Self::Basic,
            "dearness_allowance" | "da" => Self::DearnessAllowance,
            "house_rent_allowance" | "hra" => Self::HouseRentAllowance,
            "employer_nps_contribution" | "employer_nps" => Self::EmployerNpsContribution,
            _ => Self::Other,
        }
    }
}

/// Presumptive-scheme codes accepted in the subtype of business and
/// profession records.
pub const PRESUMPTIVE_SCHEMES: [&str; 3] = ["44AD", "44ADA", "44AE"];

/// A single income entry supplied by a data-capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub filer_id: String,
    pub financial_year: FinancialYear,
    pub category: IncomeCategory,
    pub subtype: String,
    pub gross_amount: Decimal,
    pub allowable_expense: Decimal,
    pub computed_net: Option<Decimal>,
    pub source_ref: String,
}

impl IncomeRecord {
    /// Signed net of this record: `computed_net` when the collaborator
    /// supplied one, otherwise `gross_amount - allowable_expense`. A loss is
    /// negative; clamping happens on the category total.
    pub fn net_amount(&self) -> Decimal {
        self.computed_net
            .unwrap_or(self.gross_amount - self.allowable_expense)
    }

    pub fn salary_component(&self) -> Option<SalaryComponent> {
        (self.category == IncomeCategory::Salary)
            .then(|| SalaryComponent::from_subtype(&self.subtype))
    }

    /// `Some(true)` for presumptive business/profession income, `Some(false)`
    /// for regular books, `None` for other categories.
    pub fn is_presumptive(&self) -> Option<bool> {
        self.category.is_business_or_profession().then(|| {
            PRESUMPTIVE_SCHEMES
                .iter()
                .any(|code| self.subtype.trim().eq_ignore_ascii_case(code))
        })
    }
}
