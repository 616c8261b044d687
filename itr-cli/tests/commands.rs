//! Command output over a seeded in-memory database.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use itr_cli::app;
use itr_core::db::DbConfig;
use itr_core::{
    Address, BankAccount, ClaimDetail, DeductionClaim, DeductionSection, EngineSettings,
    FinancialYear, GenerateRequest, IncomeCategory, IncomeRecord, PersonalProfile, TaxEngine,
    TaxPaidKind, TaxPaidRecord,
};
use itr_db_sqlite::SqliteRepository;

const FY: FinancialYear = FinancialYear(2024);

fn profile(filer_id: &str) -> PersonalProfile {
    PersonalProfile {
        filer_id: filer_id.to_string(),
        first_name: "Ravi".to_string(),
        middle_name: Some("K".to_string()),
        last_name: "Menon".to_string(),
        pan: "AAAPM1234Q".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 2, 1),
        email: "ravi@example.in".to_string(),
        mobile: "9811111111".to_string(),
        address: Address {
            line: "4 Marine Drive".to_string(),
            city: "Kochi".to_string(),
            state_code: "KL".to_string(),
            pin_code: "682031".to_string(),
            country_code: "IN".to_string(),
        },
        bank_account: BankAccount {
            ifsc: "SBIN0000456".to_string(),
            account_number: "000011112222".to_string(),
            bank_name: "State Bank of India".to_string(),
        },
        company_director: false,
        business: None,
    }
}

async fn add_filer(
    repo: &SqliteRepository,
    filer_id: &str,
) {
    repo.save_profile(&profile(filer_id)).await.unwrap();
    for (subtype, amount) in [
        ("basic", dec!(600000)),
        ("dearness_allowance", dec!(100000)),
        ("employer_nps_contribution", dec!(50000)),
        ("special_allowance", dec!(250000)),
    ] {
        repo.insert_income_record(&IncomeRecord {
            filer_id: filer_id.to_string(),
            financial_year: FY,
            category: IncomeCategory::Salary,
            subtype: subtype.to_string(),
            gross_amount: amount,
            allowable_expense: Decimal::ZERO,
            computed_net: None,
            source_ref: "form16".to_string(),
        })
        .await
        .unwrap();
    }
    repo.insert_deduction_claim(&DeductionClaim {
        filer_id: filer_id.to_string(),
        financial_year: FY,
        section: DeductionSection::Sec80C,
        claimed_amount: dec!(200000),
        evidence_ref: "elss".to_string(),
        detail: ClaimDetail::None,
    })
    .await
    .unwrap();
    repo.insert_tax_paid_record(&TaxPaidRecord {
        filer_id: filer_id.to_string(),
        financial_year: FY,
        kind: TaxPaidKind::Tds,
        amount: dec!(60000),
        reference: "26AS".to_string(),
    })
    .await
    .unwrap();
}

async fn engine_with(filers: &[&str]) -> TaxEngine<SqliteRepository> {
    let repo = SqliteRepository::new(":memory:").await.unwrap();
    repo.run_migrations().await.unwrap();
    repo.run_seeds(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../itr-db-sqlite/seeds"))
        .await
        .unwrap();
    for filer in filers {
        add_filer(&repo, filer).await;
    }
    TaxEngine::new(Arc::new(repo), EngineSettings::default())
}

#[tokio::test]
async fn compute_prints_both_regimes_and_recommendation() {
    let engine = engine_with(&["F1"]).await;

    let outcome = engine.compute_tax("F1", FY).await.unwrap();
    let text = app::render_outcome(&outcome);

    assert!(text.starts_with("Filer F1 | FY 2024-25 (AY 2025-26)"), "{text}");
    assert!(text.contains("Recommended: NEW (saves 20800)"), "{text}");
    assert!(text.contains("refund due 15800"), "{text}");
    assert!(text.contains("Form: ITR1"), "{text}");
    assert!(text.contains("80C: claimed 200000 clamped to 150000"), "{text}");
}

#[tokio::test]
async fn generation_summary_and_history() {
    let engine = engine_with(&["F1"]).await;
    let request = GenerateRequest::new("F1", FY);

    let first = engine.generate_return(&request).await.unwrap();
    let second = engine.regenerate_return(&request).await.unwrap();
    let history = engine.history("F1", FY).await.unwrap();

    let summary = app::render_generation(&second);
    assert!(
        summary.contains(&format!("Generated #{} F1 FY 2024-25 ITR1", second.document.id)),
        "{summary}"
    );

    let rendered = app::render_history(&history);
    let lines: Vec<_> = rendered.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(&format!("#{} ", second.document.id)));
    assert!(lines[0].contains("GENERATED"));
    assert!(lines[1].contains(&format!("#{} ", first.document.id)));
    assert!(lines[1].contains("SUPERSEDED"));
}

#[tokio::test]
async fn bulk_summary_reports_failures() {
    let engine = engine_with(&["F1", "F2"]).await;
    let requests = ["F2", "ghost", "F1"]
        .into_iter()
        .map(|filer| GenerateRequest::new(filer, FY))
        .collect();

    let results = engine.generate_bulk(requests).await;
    let rendered = app::render_bulk(&results);
    let lines: Vec<_> = rendered.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("ok     #"), "{rendered}");
    assert!(lines[0].contains(" F1 "), "{rendered}");
    assert!(lines[1].contains(" F2 "), "{rendered}");
    assert!(lines[2].starts_with("failed ghost:"), "{rendered}");
    assert_eq!(lines[3], "2 generated, 1 failed");
}

#[tokio::test]
async fn open_engine_uses_configured_backend() {
    let settings = EngineSettings {
        database: DbConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        },
        ..Default::default()
    };

    let engine = app::open_engine(settings).await.unwrap();
    let history = engine.history("nobody", FY).await.unwrap();

    assert_eq!(app::render_history(&history), "No returns generated.\n");
}

#[tokio::test]
async fn open_engine_rejects_unknown_backend() {
    let settings = EngineSettings {
        database: DbConfig {
            backend: "oracle".to_string(),
            connection_string: "x".to_string(),
        },
        ..Default::default()
    };

    let err = app::open_engine(settings).await.err().unwrap();

    assert!(format!("{err:#}").contains("Failed to open oracle database"));
}
