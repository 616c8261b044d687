//! Return-document schemas, versioned by assessment year.
//!
//! A schema is a flat list of field rules addressed by dotted paths into
//! the payload. Validation never stops at the first problem; every
//! violation is reported.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::FormType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    NonEmptyText,
    /// `YYYY-MM-DD`.
    Date,
    /// Permanent account number: five letters, four digits, one letter.
    Pan,
    /// Six-digit postal code.
    PinCode,
    /// Whole rupees, non-negative.
    Amount,
    Boolean,
    /// Object whose every value is an [`FieldKind::Amount`].
    AmountMap,
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::NonEmptyText => "a non-empty string",
            Self::Date => "a YYYY-MM-DD date",
            Self::Pan => "a PAN (AAAAA9999A)",
            Self::PinCode => "a six-digit PIN code",
            Self::Amount => "a non-negative whole-rupee amount",
            Self::Boolean => "a boolean",
            Self::AmountMap => "an object of non-negative amounts",
        }
    }

    fn accepts(
        &self,
        value: &Value,
    ) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::NonEmptyText => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            Self::Date => value
                .as_str()
                .is_some_and(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            Self::Pan => value.as_str().is_some_and(is_pan),
            Self::PinCode => value
                .as_str()
                .is_some_and(|s| s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit())),
            Self::Amount => is_amount(value),
            Self::Boolean => value.is_boolean(),
            Self::AmountMap => value
                .as_object()
                .is_some_and(|map| map.values().all(is_amount)),
        }
    }
}

fn is_amount(value: &Value) -> bool {
    value.as_u64().is_some()
}

fn is_pan(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_uppercase)
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub path: &'static str,
    pub kind: FieldKind,
}

const fn rule(
    path: &'static str,
    kind: FieldKind,
) -> FieldRule {
    FieldRule { path, kind }
}

const COMMON_RULES: &[FieldRule] = &[
    rule("FormInfo.FormName", FieldKind::NonEmptyText),
    rule("FormInfo.SchemaVersion", FieldKind::NonEmptyText),
    rule("FormInfo.AssessmentYear", FieldKind::NonEmptyText),
    rule("FormInfo.FinancialYear", FieldKind::NonEmptyText),
    rule("FilerIdentity.FirstName", FieldKind::NonEmptyText),
    rule("FilerIdentity.LastName", FieldKind::NonEmptyText),
    rule("FilerIdentity.PAN", FieldKind::Pan),
    rule("FilerIdentity.DateOfBirth", FieldKind::Date),
    rule("FilerIdentity.Email", FieldKind::Text),
    rule("FilerIdentity.Mobile", FieldKind::Text),
    rule("FilerIdentity.Address.Line", FieldKind::NonEmptyText),
    rule("FilerIdentity.Address.City", FieldKind::NonEmptyText),
    rule("FilerIdentity.Address.StateCode", FieldKind::NonEmptyText),
    rule("FilerIdentity.Address.PinCode", FieldKind::PinCode),
    rule("FilerIdentity.BankAccount.IFSC", FieldKind::NonEmptyText),
    rule("FilerIdentity.BankAccount.AccountNumber", FieldKind::NonEmptyText),
    rule("FilerIdentity.CompanyDirector", FieldKind::Boolean),
    rule("Deductions.Sections", FieldKind::AmountMap),
    rule("Deductions.ChapterVIA", FieldKind::Amount),
    rule("Deductions.Total", FieldKind::Amount),
    rule("TaxComputation.Regime", FieldKind::NonEmptyText),
    rule("TaxComputation.GrossTotalIncome", FieldKind::Amount),
    rule("TaxComputation.TotalDeductions", FieldKind::Amount),
    rule("TaxComputation.TaxableIncome", FieldKind::Amount),
    rule("TaxComputation.TaxBeforeRebate", FieldKind::Amount),
    rule("TaxComputation.Rebate87A", FieldKind::Amount),
    rule("TaxComputation.Surcharge", FieldKind::Amount),
    rule("TaxComputation.Cess", FieldKind::Amount),
    rule("TaxComputation.NetTaxPayable", FieldKind::Amount),
    rule("TaxPaid.TDS", FieldKind::Amount),
    rule("TaxPaid.TCS", FieldKind::Amount),
    rule("TaxPaid.AdvanceTax", FieldKind::Amount),
    rule("TaxPaid.SelfAssessment", FieldKind::Amount),
    rule("TaxPaid.Total", FieldKind::Amount),
    rule("TaxPaid.BalancePayable", FieldKind::Amount),
    rule("TaxPaid.Refund", FieldKind::Amount),
    rule("Verification.Name", FieldKind::NonEmptyText),
    rule("Verification.PAN", FieldKind::Pan),
    rule("Verification.Capacity", FieldKind::NonEmptyText),
];

const FORM1_SCHEDULES: &[FieldRule] = &[
    rule("IncomeSchedules.ScheduleSalary.NetSalary", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleHouseProperty.NetIncome", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleHouseProperty.Properties", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleOtherSources.Interest", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleOtherSources.Dividend", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleOtherSources.Other", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleOtherSources.Total", FieldKind::Amount),
];

const FORM2_SCHEDULES: &[FieldRule] = &[
    rule("IncomeSchedules.ScheduleCapitalGains.ShortTerm", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleCapitalGains.LongTerm", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleCapitalGains.Total", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleVDA.Income", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleForeignAssets.Income", FieldKind::Amount),
];

const FORM3_SCHEDULES: &[FieldRule] = &[
    rule("IncomeSchedules.ScheduleBusiness.Business", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleBusiness.Profession", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleBusiness.Total", FieldKind::Amount),
    rule("IncomeSchedules.ScheduleBusiness.TradeName", FieldKind::NonEmptyText),
    rule("IncomeSchedules.ScheduleBusiness.NatureOfBusinessCode", FieldKind::NonEmptyText),
    rule("IncomeSchedules.ProfitAndLoss.GrossReceipts", FieldKind::Amount),
    rule("IncomeSchedules.ProfitAndLoss.Expenses", FieldKind::Amount),
    rule("IncomeSchedules.ProfitAndLoss.NetProfit", FieldKind::Amount),
    rule("IncomeSchedules.BalanceSheet.TotalAssets", FieldKind::Amount),
    rule("IncomeSchedules.BalanceSheet.TotalLiabilities", FieldKind::Amount),
    rule("IncomeSchedules.BalanceSheet.ProprietorCapital", FieldKind::Amount),
];

const FORM4_SCHEDULES: &[FieldRule] = &[
    rule("IncomeSchedules.SchedulePresumptive.Business", FieldKind::Amount),
    rule("IncomeSchedules.SchedulePresumptive.Profession", FieldKind::Amount),
    rule("IncomeSchedules.SchedulePresumptive.Total", FieldKind::Amount),
    rule("IncomeSchedules.SchedulePresumptive.TradeName", FieldKind::NonEmptyText),
    rule(
        "IncomeSchedules.SchedulePresumptive.NatureOfBusinessCode",
        FieldKind::NonEmptyText,
    ),
];

/// From AY 2025-26 the New regime is the default and the payload records
/// whether the filer opted out of it.
const REGIME_OPT_OUT: FieldRule = rule("FormInfo.NewRegimeOptOut", FieldKind::Boolean);

const VERIFICATION_PLACE: FieldRule = rule("Verification.Place", FieldKind::NonEmptyText);

/// The schedule groups each form carries, in payload order.
pub fn schedule_rules(form: FormType) -> Vec<&'static [FieldRule]> {
    match form {
        FormType::Itr1 => vec![FORM1_SCHEDULES],
        FormType::Itr2 => vec![FORM1_SCHEDULES, FORM2_SCHEDULES],
        FormType::Itr3 => vec![FORM1_SCHEDULES, FORM2_SCHEDULES, FORM3_SCHEDULES],
        FormType::Itr4 => vec![FORM1_SCHEDULES, FORM4_SCHEDULES],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    pub version: String,
    pub assessment_year: i32,
    pub form: FormType,
    pub rules: Vec<FieldRule>,
}

impl FormSchema {
    /// Every violation in the payload, in rule order.
    pub fn validate(
        &self,
        payload: &Value,
    ) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| match lookup(payload, rule.path) {
                None | Some(Value::Null) => Some(format!("{}: missing", rule.path)),
                Some(value) if !rule.kind.accepts(value) => {
                    Some(format!("{}: expected {}", rule.path, rule.kind.describe()))
                }
                Some(_) => None,
            })
            .collect()
    }
}

fn lookup<'v>(
    payload: &'v Value,
    path: &str,
) -> Option<&'v Value> {
    path.split('.')
        .try_fold(payload, |value, segment| value.get(segment))
}

/// Known schema versions with the assessment year each applies to.
const VERSIONS: [(i32, &str); 3] = [
    (2024, "2024-25.1"),
    (2025, "2025-26.1"),
    (2026, "2026-27.1"),
];

/// Every form schema the engine can emit, keyed by version and form.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    schemas: BTreeMap<(String, FormType), FormSchema>,
}

impl SchemaCatalog {
    pub fn builtin() -> Self {
        let mut schemas = BTreeMap::new();
        for (assessment_year, version) in VERSIONS {
            for form in FormType::ALL {
                let mut rules: Vec<FieldRule> = COMMON_RULES.to_vec();
                for group in schedule_rules(form) {
                    rules.extend_from_slice(group);
                }
                if assessment_year >= 2025 {
                    rules.push(REGIME_OPT_OUT);
                }
                if assessment_year >= 2026 {
                    rules.push(VERIFICATION_PLACE);
                }
                schemas.insert(
                    (version.to_string(), form),
                    FormSchema {
                        version: version.to_string(),
                        assessment_year,
                        form,
                        rules,
                    },
                );
            }
        }
        Self { schemas }
    }

    pub fn schema(
        &self,
        version: &str,
        form: FormType,
    ) -> Option<&FormSchema> {
        self.schemas.get(&(version.to_string(), form))
    }

    /// Version labels, oldest first.
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.schemas.keys().map(|(v, _)| v.as_str()).collect();
        versions.dedup();
        versions
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
