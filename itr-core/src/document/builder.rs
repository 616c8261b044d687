//! Payload assembly.
//!
//! The payload is a plain `serde_json::Value`. Amounts are whole rupees,
//! and nothing time-dependent is included, so identical inputs always
//! produce an identical payload.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};

use crate::calculations::common::round_rupee;
use crate::error::EngineError;
use crate::models::{
    AssessmentYearConfig, ComputationWarning, DeductionLedger, FinancialYear, FormType,
    IncomeCategory, IncomeLedger, PersonalProfile, Regime, TaxComputationResult, TaxPaidKind,
    TaxPaidSummary,
};

/// Everything the generator needs for one return.
#[derive(Debug, Clone, Copy)]
pub struct ReturnInputs<'a> {
    pub financial_year: FinancialYear,
    pub form_type: FormType,
    /// Regime the return is filed under.
    pub regime: Regime,
    pub profile: &'a PersonalProfile,
    pub income: &'a IncomeLedger,
    /// Deductions computed for `regime`.
    pub deductions: &'a DeductionLedger,
    pub computation: &'a TaxComputationResult,
    pub tax_paid: &'a TaxPaidSummary,
    pub config: &'a AssessmentYearConfig,
    pub warnings: &'a [ComputationWarning],
}

fn rupees(amount: Decimal) -> Result<Value, EngineError> {
    round_rupee(amount)
        .to_i64()
        .map(Value::from)
        .ok_or_else(|| EngineError::Encoding(format!("amount {amount} out of range")))
}

pub fn build_payload(inputs: &ReturnInputs<'_>) -> Result<Value, EngineError> {
    Ok(json!({
        "FormInfo": form_info(inputs),
        "FilerIdentity": filer_identity(inputs.profile),
        "IncomeSchedules": income_schedules(inputs)?,
        "Deductions": deductions(inputs.deductions)?,
        "TaxComputation": tax_computation(inputs)?,
        "TaxPaid": tax_paid(inputs)?,
        "Verification": verification(inputs.profile),
    }))
}

fn form_info(inputs: &ReturnInputs<'_>) -> Value {
    json!({
        "FormName": inputs.form_type.as_str(),
        "SchemaVersion": inputs.config.schema_version,
        "AssessmentYear": inputs.financial_year.assessment_year_label(),
        "FinancialYear": inputs.financial_year.to_string(),
        "NewRegimeOptOut": inputs.regime == Regime::Old,
    })
}

fn filer_identity(profile: &PersonalProfile) -> Value {
    let mut identity = json!({
        "FirstName": profile.first_name,
        "LastName": profile.last_name,
        "PAN": profile.pan.trim().to_ascii_uppercase(),
        "DateOfBirth": profile.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
        "Email": profile.email,
        "Mobile": profile.mobile,
        "Address": {
            "Line": profile.address.line,
            "City": profile.address.city,
            "StateCode": profile.address.state_code,
            "PinCode": profile.address.pin_code,
            "CountryCode": profile.address.country_code,
        },
        "BankAccount": {
            "IFSC": profile.bank_account.ifsc,
            "AccountNumber": profile.bank_account.account_number,
            "BankName": profile.bank_account.bank_name,
        },
        "CompanyDirector": profile.company_director,
    });
    if let Some(middle) = profile.middle_name.as_deref().filter(|m| !m.trim().is_empty()) {
        identity["MiddleName"] = Value::from(middle);
    }
    identity
}

fn income_schedules(inputs: &ReturnInputs<'_>) -> Result<Value, EngineError> {
    let income = inputs.income;
    let mut schedules = Map::new();

    let interest = income.net(IncomeCategory::Interest);
    let dividend = income.net(IncomeCategory::Dividend);
    let other = income.net(IncomeCategory::OtherSources);
    schedules.insert(
        "ScheduleSalary".into(),
        json!({ "NetSalary": rupees(income.net(IncomeCategory::Salary))? }),
    );
    schedules.insert(
        "ScheduleHouseProperty".into(),
        json!({
            "NetIncome": rupees(income.net(IncomeCategory::HouseProperty))?,
            "Properties": income.house_property_count,
        }),
    );
    schedules.insert(
        "ScheduleOtherSources".into(),
        json!({
            "Interest": rupees(interest)?,
            "Dividend": rupees(dividend)?,
            "Other": rupees(other)?,
            "Total": rupees(interest + dividend + other)?,
        }),
    );

    if matches!(inputs.form_type, FormType::Itr2 | FormType::Itr3) {
        let short = income.net(IncomeCategory::CapitalGainsShort);
        let long = income.net(IncomeCategory::CapitalGainsLong);
        schedules.insert(
            "ScheduleCapitalGains".into(),
            json!({
                "ShortTerm": rupees(short)?,
                "LongTerm": rupees(long)?,
                "Total": rupees(short + long)?,
            }),
        );
        schedules.insert(
            "ScheduleVDA".into(),
            json!({ "Income": rupees(income.net(IncomeCategory::VirtualDigitalAsset))? }),
        );
        schedules.insert(
            "ScheduleForeignAssets".into(),
            json!({ "Income": rupees(income.net(IncomeCategory::ForeignAsset))? }),
        );
    }

    let business = income.net(IncomeCategory::Business);
    let profession = income.net(IncomeCategory::Profession);
    let trade = inputs.profile.business.as_ref();
    let trade_name = trade.map(|b| b.trade_name.as_str()).unwrap_or_default();
    let nature_code = trade
        .map(|b| b.nature_of_business_code.as_str())
        .unwrap_or_default();

    match inputs.form_type {
        FormType::Itr3 => {
            schedules.insert(
                "ScheduleBusiness".into(),
                json!({
                    "Business": rupees(business)?,
                    "Profession": rupees(profession)?,
                    "Total": rupees(business + profession)?,
                    "TradeName": trade_name,
                    "NatureOfBusinessCode": nature_code,
                }),
            );
            schedules.insert(
                "ProfitAndLoss".into(),
                json!({
                    "GrossReceipts": rupees(income.business_turnover)?,
                    "Expenses": rupees(income.business_expenses)?,
                    "NetProfit": rupees(business + profession)?,
                }),
            );
            // Left out when the profile has no balance sheet; the schema
            // then reports the missing fields.
            if let Some(sheet) = trade.and_then(|b| b.balance_sheet.as_ref()) {
                schedules.insert(
                    "BalanceSheet".into(),
                    json!({
                        "TotalAssets": rupees(sheet.total_assets)?,
                        "TotalLiabilities": rupees(sheet.total_liabilities)?,
                        "ProprietorCapital": rupees(sheet.proprietor_capital)?,
                    }),
                );
            }
        }
        FormType::Itr4 => {
            schedules.insert(
                "SchedulePresumptive".into(),
                json!({
                    "Business": rupees(business)?,
                    "Profession": rupees(profession)?,
                    "Total": rupees(business + profession)?,
                    "TradeName": trade_name,
                    "NatureOfBusinessCode": nature_code,
                }),
            );
        }
        FormType::Itr1 | FormType::Itr2 => {}
    }

    Ok(Value::Object(schedules))
}

fn deductions(ledger: &DeductionLedger) -> Result<Value, EngineError> {
    let mut sections = Map::new();
    for (section, amount) in &ledger.by_section {
        sections.insert(section.code().to_string(), rupees(*amount)?);
    }
    Ok(json!({
        "Sections": sections,
        "ChapterVIA": rupees(ledger.chapter_via_total())?,
        "Total": rupees(ledger.total_deductions)?,
    }))
}

fn tax_computation(inputs: &ReturnInputs<'_>) -> Result<Value, EngineError> {
    let result = inputs.computation;
    let chosen = result.for_regime(inputs.regime);
    Ok(json!({
        "Regime": inputs.regime.as_str(),
        "GrossTotalIncome": rupees(chosen.gross_total_income)?,
        "TotalDeductions": rupees(chosen.total_deductions)?,
        "TaxableIncome": rupees(chosen.taxable_income)?,
        "TaxBeforeRebate": rupees(chosen.tax_before_rebate)?,
        "Rebate87A": rupees(chosen.rebate_87a)?,
        "Surcharge": rupees(chosen.surcharge)?,
        "Cess": rupees(chosen.cess)?,
        "NetTaxPayable": rupees(chosen.net_tax_payable)?,
        "RegimeComparison": {
            "OldRegimeTax": rupees(result.old_regime.net_tax_payable)?,
            "NewRegimeTax": rupees(result.new_regime.net_tax_payable)?,
            "Recommended": result.recommended_regime.as_str(),
        },
    }))
}

fn tax_paid(inputs: &ReturnInputs<'_>) -> Result<Value, EngineError> {
    let summary = inputs.tax_paid;
    let net = inputs.computation.for_regime(inputs.regime).net_tax_payable;
    let balance = summary.balance(net);
    Ok(json!({
        "TDS": rupees(summary.amount(TaxPaidKind::Tds))?,
        "TCS": rupees(summary.amount(TaxPaidKind::Tcs))?,
        "AdvanceTax": rupees(summary.amount(TaxPaidKind::AdvanceTax))?,
        "SelfAssessment": rupees(summary.amount(TaxPaidKind::SelfAssessment))?,
        "Total": rupees(summary.total_tax_paid)?,
        "BalancePayable": rupees(balance.payable())?,
        "Refund": rupees(balance.refundable())?,
    }))
}

fn verification(profile: &PersonalProfile) -> Value {
    json!({
        "Name": profile.full_name(),
        "PAN": profile.pan.trim().to_ascii_uppercase(),
        "Capacity": "Self",
        "Place": profile.address.city,
    })
}
