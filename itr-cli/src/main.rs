use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use itr_core::{FinancialYear, GenerateRequest, Regime};
use serde::Serialize;
use tracing::{debug, info};

use itr_cli::app::{self, Engine};
use itr_cli::config::{SettingsOverrides, load_settings};
use itr_cli::logging::init_logging;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Indian income-tax computation and ITR return generation.
///
/// Reads filer records from the configured database, computes liability
/// under both regimes and produces checksummed return documents.
#[derive(Debug, Parser)]
#[command(name = "itr", version)]
struct Cli {
    /// Settings file; `itr.toml` in the working directory when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `itr.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Also append log events to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    request_timeout_ms: Option<u64>,

    #[arg(long, global = true)]
    collaborator_timeout_ms: Option<u64>,

    #[arg(long, global = true)]
    bulk_concurrency: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute tax under both regimes without saving anything.
    Compute {
        #[arg(long)]
        filer: String,
        /// Financial year, e.g. `2024-25` or `2024`.
        #[arg(long)]
        year: FinancialYear,
    },
    /// Generate and store a return document.
    Generate {
        #[arg(long)]
        filer: String,
        #[arg(long)]
        year: FinancialYear,
        /// File under this regime instead of the recommended one.
        #[arg(long, value_parser = parse_regime)]
        regime: Option<Regime>,
        /// Also write the payload to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate again for a filer that already has a return on file.
    Regenerate {
        #[arg(long)]
        filer: String,
        #[arg(long)]
        year: FinancialYear,
        #[arg(long, value_parser = parse_regime)]
        regime: Option<Regime>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Verify and fetch a stored return; the payload goes to stdout unless
    /// `--output` is given.
    Download {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List every return generated for a filer and year, newest first.
    History {
        #[arg(long)]
        filer: String,
        #[arg(long)]
        year: FinancialYear,
    },
    /// Generate returns for many filers at once.
    Bulk {
        #[arg(long)]
        year: FinancialYear,
        /// Comma-separated filer ids.
        #[arg(long, value_delimiter = ',', conflicts_with = "filers_file")]
        filers: Vec<String>,
        /// File with one filer id per line.
        #[arg(long)]
        filers_file: Option<PathBuf>,
    },
}

fn parse_regime(s: &str) -> Result<Regime, String> {
    Regime::parse(s).ok_or_else(|| format!("unknown regime '{s}' (expected old or new)"))
}

// ─── output ──────────────────────────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{text}");
    Ok(())
}

fn write_payload(
    path: &Path,
    payload: &str,
) -> anyhow::Result<()> {
    std::fs::write(path, payload)
        .with_context(|| format!("Failed to write payload to '{}'", path.display()))?;
    info!(path = %path.display(), "payload written");
    Ok(())
}

// ─── commands ────────────────────────────────────────────────────────────────

async fn generate(
    engine: &Engine,
    request: GenerateRequest,
    regenerate: bool,
    output: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = if regenerate {
        engine.regenerate_return(&request).await
    } else {
        engine.generate_return(&request).await
    }
    .with_context(|| {
        format!(
            "Failed to generate return for {} FY {}",
            request.filer_id, request.financial_year
        )
    })?;

    if let Some(path) = output {
        write_payload(path, &outcome.document.payload)?;
    }
    if json {
        print_json(&outcome.document)
    } else {
        print!("{}", app::render_generation(&outcome));
        Ok(())
    }
}

async fn run(
    engine: &Engine,
    command: Command,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Compute { filer, year } => {
            let outcome = engine
                .compute_tax(&filer, year)
                .await
                .with_context(|| format!("Failed to compute tax for {filer} FY {year}"))?;
            if json {
                print_json(&outcome)?;
            } else {
                print!("{}", app::render_outcome(&outcome));
            }
        }
        Command::Generate {
            filer,
            year,
            regime,
            output,
        } => {
            let mut request = GenerateRequest::new(filer, year);
            request.regime = regime;
            generate(engine, request, false, output.as_deref(), json).await?;
        }
        Command::Regenerate {
            filer,
            year,
            regime,
            output,
        } => {
            let mut request = GenerateRequest::new(filer, year);
            request.regime = regime;
            generate(engine, request, true, output.as_deref(), json).await?;
        }
        Command::Download { id, output } => {
            let document = engine
                .download_return(id)
                .await
                .with_context(|| format!("Failed to download return {id}"))?;
            match output {
                Some(path) => {
                    write_payload(&path, &document.payload)?;
                    if json {
                        print_json(&document)?;
                    } else {
                        println!("{}", app::render_document(&document));
                    }
                }
                None => println!("{}", document.payload),
            }
        }
        Command::History { filer, year } => {
            let documents = engine
                .history(&filer, year)
                .await
                .with_context(|| format!("Failed to list returns for {filer} FY {year}"))?;
            if json {
                print_json(&documents)?;
            } else {
                print!("{}", app::render_history(&documents));
            }
        }
        Command::Bulk {
            year,
            filers,
            filers_file,
        } => {
            let filers = match filers_file {
                Some(path) => {
                    let text = std::fs::read_to_string(&path).with_context(|| {
                        format!("Failed to read filer list '{}'", path.display())
                    })?;
                    app::read_filer_list(&text)
                }
                None => filers,
            };
            if filers.is_empty() {
                bail!("No filers given; use --filers or --filers-file");
            }

            let requests = filers
                .into_iter()
                .map(|filer| GenerateRequest::new(filer, year))
                .collect();
            let results = engine.generate_bulk(requests).await;
            print!("{}", app::render_bulk(&results));

            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            if failed > 0 {
                bail!("{failed} of {} returns failed", results.len());
            }
        }
    }
    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let overrides = SettingsOverrides {
        backend: cli.backend,
        database: cli.db,
        request_timeout_ms: cli.request_timeout_ms,
        collaborator_timeout_ms: cli.collaborator_timeout_ms,
        bulk_concurrency: cli.bulk_concurrency,
    };
    let settings = overrides.apply(load_settings(cli.config.as_deref())?);
    debug!(?settings, "effective settings");

    let engine = app::open_engine(settings).await?;
    run(&engine, cli.command, cli.json).await
}
