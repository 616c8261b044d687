use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Address {
    pub line: String,
    pub city: String,
    pub state_code: String,
    pub pin_code: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BankAccount {
    pub ifsc: String,
    pub account_number: String,
    pub bank_name: String,
}

/// Balance-sheet totals reported on the regular-books business schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub proprietor_capital: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BusinessProfile {
    pub trade_name: String,
    pub nature_of_business_code: String,
    pub balance_sheet: Option<BalanceSheet>,
}

/// Identity and filing details copied verbatim into the return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PersonalProfile {
    pub filer_id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub pan: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub mobile: String,
    pub address: Address,
    pub bank_account: BankAccount,
    pub company_director: bool,
    pub business: Option<BusinessProfile>,
}

impl PersonalProfile {
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Names of identity fields that a return cannot be filed without.
    pub fn missing_identity_fields(&self) -> Vec<String> {
        let required = [
            ("profile.first_name", self.first_name.as_str()),
            ("profile.last_name", self.last_name.as_str()),
            ("profile.pan", self.pan.as_str()),
            ("profile.address.line", self.address.line.as_str()),
            ("profile.address.city", self.address.city.as_str()),
            ("profile.address.state_code", self.address.state_code.as_str()),
            ("profile.address.pin_code", self.address.pin_code.as_str()),
            ("profile.bank_account.ifsc", self.bank_account.ifsc.as_str()),
            (
                "profile.bank_account.account_number",
                self.bank_account.account_number.as_str(),
            ),
        ];

        let mut missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if self.date_of_birth.is_none() {
            missing.push("profile.date_of_birth".to_string());
        }
        missing
    }
}
