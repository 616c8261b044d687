use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid financial year '{0}' (expected e.g. 2024-25 or 2024)")]
pub struct FinancialYearParseError(pub String);

/// A financial year, identified by the calendar year in which it starts.
///
/// `FinancialYear(2024)` runs from 1 April 2024 to 31 March 2025 and is
/// assessed in assessment year 2025-26.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialYear(pub i32);

impl FinancialYear {
    pub fn start_year(&self) -> i32 {
        self.0
    }

    /// The assessment year in which this financial year's return is filed,
    /// keyed by its starting calendar year (FY 2024-25 → 2025).
    pub fn assessment_year(&self) -> i32 {
        self.0 + 1
    }

    /// Display label of the assessment year, e.g. `2025-26`.
    pub fn assessment_year_label(&self) -> String {
        FinancialYear(self.assessment_year()).to_string()
    }

    /// Last day of the financial year (31 March of the following year).
    pub fn last_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 + 1, 3, 31)
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.0, (self.0 + 1).rem_euclid(100))
    }
}

impl FromStr for FinancialYear {
    type Err = FinancialYearParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FinancialYearParseError(s.to_string());
        let trimmed = s.trim();

        match trimmed.split_once('-') {
            Some((start, end)) => {
                let start: i32 = start.parse().map_err(|_| err())?;
                let end: i32 = end.parse().map_err(|_| err())?;
                if end != (start + 1).rem_euclid(100) && end != start + 1 {
                    return Err(err());
                }
                Ok(FinancialYear(start))
            }
            None => trimmed.parse().map(FinancialYear).map_err(|_| err()),
        }
    }
}
