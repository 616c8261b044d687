use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use itr_data::TaxSlabLoader;
use itr_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load progressive slab tables from a CSV file into the database.
///
/// Columns: assessment_year, regime (OLD/NEW), age_band (BELOW_60, SENIOR,
/// SUPER_SENIOR or ALL), min_income, max_income (empty for the top slab),
/// base_tax, rate (e.g. 0.05).
#[derive(Parser, Debug)]
#[command(name = "itr-slab-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV file with slab rows
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path, created if missing
    #[arg(short, long, default_value = "itr.db")]
    database: String,

    /// Run database migrations before loading
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from this directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to open database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
    }

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = TaxSlabLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} rows from {}", records.len(), args.file.display());

    let inserted = TaxSlabLoader::load(&repo, &records)
        .await
        .context("Failed to load slab tables into database")?;

    println!("Loaded {inserted} slab rows.");

    Ok(())
}
