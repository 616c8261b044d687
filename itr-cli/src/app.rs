use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use itr_core::db::RepositoryRegistry;
use itr_core::{
    ComputationOutcome, EngineError, EngineSettings, GenerateRequest, GenerationOutcome,
    RegimeComputation, ReturnDocument, TaxBalance, TaxEngine, TaxRepository,
};
use itr_db_sqlite::SqliteRepositoryFactory;
use tracing::debug;

pub type Engine = TaxEngine<dyn TaxRepository>;

/// Creates a registry with every compiled-in backend registered.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Opens the configured backend and wraps it in an engine.
pub async fn open_engine(settings: EngineSettings) -> Result<Engine> {
    debug!(
        backend = %settings.database.backend,
        connection = %settings.database.connection_string,
        "opening repository"
    );
    let repository = build_registry()
        .create(&settings.database)
        .await
        .with_context(|| {
            format!(
                "Failed to open {} database '{}'",
                settings.database.backend, settings.database.connection_string
            )
        })?;

    Ok(TaxEngine::new(Arc::from(repository), settings))
}

/// Filer ids from a list file: one per line, blank lines and `#` comments
/// skipped.
pub fn read_filer_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn regime_column(
    out: &mut String,
    label: &str,
    old: &RegimeComputation,
    new: &RegimeComputation,
    pick: fn(&RegimeComputation) -> rust_decimal::Decimal,
) {
    let _ = writeln!(out, "  {label:<22} {:>14} {:>14}", pick(old), pick(new));
}

fn balance_line(balance: &TaxBalance) -> String {
    match balance {
        TaxBalance::Payable(amount) => format!("tax payable {amount}"),
        TaxBalance::Refundable(amount) => format!("refund due {amount}"),
    }
}

/// Human-readable comparison of both regimes.
pub fn render_outcome(outcome: &ComputationOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Filer {} | FY {} (AY {}) | {:?}",
        outcome.filer_id,
        outcome.financial_year,
        outcome.financial_year.assessment_year_label(),
        outcome.age_band
    );

    let _ = writeln!(out, "Income");
    for (category, amount) in &outcome.income.by_category {
        let _ = writeln!(out, "  {category:<22} {amount:>14}");
    }
    let _ = writeln!(
        out,
        "  {:<22} {:>14}",
        "gross total", outcome.income.gross_total_income
    );

    let old = &outcome.result.old_regime;
    let new = &outcome.result.new_regime;
    let _ = writeln!(out, "  {:<22} {:>14} {:>14}", "", "OLD", "NEW");
    regime_column(&mut out, "deductions", old, new, |r| r.total_deductions);
    regime_column(&mut out, "taxable income", old, new, |r| r.taxable_income);
    regime_column(&mut out, "tax before rebate", old, new, |r| r.tax_before_rebate);
    regime_column(&mut out, "rebate 87A", old, new, |r| r.rebate_87a);
    regime_column(&mut out, "surcharge", old, new, |r| r.surcharge);
    regime_column(&mut out, "cess", old, new, |r| r.cess);
    regime_column(&mut out, "net tax payable", old, new, |r| r.net_tax_payable);

    let _ = writeln!(
        out,
        "Recommended: {} (saves {})",
        outcome.result.recommended_regime,
        outcome.result.savings()
    );
    let _ = writeln!(
        out,
        "Tax paid {}; {}",
        outcome.tax_paid.total_tax_paid,
        balance_line(&outcome.balance)
    );
    let _ = writeln!(out, "Form: {}", outcome.form_type);

    if outcome.has_warnings() {
        let _ = writeln!(out, "Warnings:");
        for warning in &outcome.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }
    out
}

/// One-line summary of a stored document.
pub fn render_document(document: &ReturnDocument) -> String {
    let mut line = format!(
        "#{} {} FY {} {} schema {} {} checksum {}",
        document.id,
        document.filer_id,
        document.financial_year,
        document.form_type,
        document.schema_version,
        document.status.as_str(),
        document.checksum,
    );
    if document.generated_with_warnings() {
        let _ = write!(line, " ({} warnings)", document.warnings.len());
    }
    line
}

pub fn render_history(documents: &[ReturnDocument]) -> String {
    if documents.is_empty() {
        return "No returns generated.\n".to_string();
    }
    documents.iter().fold(String::new(), |mut out, document| {
        let _ = writeln!(
            out,
            "{} {}",
            document.generated_at.format("%Y-%m-%d %H:%M:%S"),
            render_document(document)
        );
        out
    })
}

pub fn render_generation(outcome: &GenerationOutcome) -> String {
    format!(
        "{}\nGenerated {}\n",
        render_outcome(&outcome.computation).trim_end(),
        render_document(&outcome.document)
    )
}

/// One line per filer, sorted by filer id, then the totals.
pub fn render_bulk(results: &[(GenerateRequest, Result<GenerationOutcome, EngineError>)]) -> String {
    let mut rows: Vec<_> = results.iter().collect();
    rows.sort_by(|a, b| a.0.filer_id.cmp(&b.0.filer_id));

    let mut out = String::new();
    for (request, result) in &rows {
        match result {
            Ok(outcome) => {
                let _ = writeln!(out, "ok     {}", render_document(&outcome.document));
            }
            Err(error) => {
                let _ = writeln!(out, "failed {}: {error}", request.filer_id);
            }
        }
    }
    let failed = rows.iter().filter(|(_, r)| r.is_err()).count();
    let _ = writeln!(out, "{} generated, {failed} failed", rows.len() - failed);
    out
}
