use std::collections::BTreeMap;
use std::io::Read;

use itr_core::{AgeBand, Regime, RepositoryError, StatutoryConfigSource, TaxSlab};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading slab tables.
#[derive(Debug, Error)]
pub enum TaxSlabLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid regime '{0}' (expected OLD or NEW)")]
    InvalidRegime(String),

    #[error("Invalid age band '{0}' (expected BELOW_60, SENIOR, SUPER_SENIOR or ALL)")]
    InvalidAgeBand(String),

    #[error("Invalid slab table for {assessment_year} {regime} {age_band}: {reason}")]
    InvalidSchedule {
        assessment_year: i32,
        regime: String,
        age_band: String,
        reason: String,
    },

    #[error("Assessment year {0} not found in database (have you run the seeds?)")]
    AssessmentYearNotFound(i32),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for TaxSlabLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxSlabLoaderError::CsvParse(err.to_string())
    }
}

/// Age-band column values. `ALL` expands to every band, which is how the
/// New regime (one schedule regardless of age) is usually written.
fn age_bands(code: &str) -> Result<Vec<AgeBand>, TaxSlabLoaderError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "ALL" => Ok(vec![AgeBand::Below60, AgeBand::Senior, AgeBand::SuperSenior]),
        other => AgeBand::parse(other)
            .map(|band| vec![band])
            .ok_or_else(|| TaxSlabLoaderError::InvalidAgeBand(code.to_string())),
    }
}

/// One row of a slab CSV file.
///
/// ```text
/// assessment_year,regime,age_band,min_income,max_income,base_tax,rate
/// 2025,NEW,ALL,700000,1000000,20000,0.10
/// 2025,NEW,ALL,1500000,,140000,0.30
/// ```
///
/// An empty `max_income` marks the open top slab.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxSlabRecord {
    pub assessment_year: i32,
    pub regime: String,
    pub age_band: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

type GroupKey = (i32, Regime, String);

/// Loads progressive slab tables from CSV through [`StatutoryConfigSource`],
/// so any backend that implements the trait can be populated.
pub struct TaxSlabLoader;

impl TaxSlabLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxSlabRecord>, TaxSlabLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxSlabRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Replaces the slab table of every (year, regime, age band) present in
    /// `records` and returns the number of rows inserted.
    ///
    /// Each group is validated before anything is written: it must start at
    /// zero, be contiguous and end with a single open slab. Loading the same
    /// file twice leaves the database unchanged.
    pub async fn load<R: StatutoryConfigSource + ?Sized>(
        repo: &R,
        records: &[TaxSlabRecord],
    ) -> Result<usize, TaxSlabLoaderError> {
        let mut groups: BTreeMap<GroupKey, Vec<&TaxSlabRecord>> = BTreeMap::new();
        for record in records {
            let regime = Regime::parse(&record.regime)
                .ok_or_else(|| TaxSlabLoaderError::InvalidRegime(record.regime.clone()))?;
            groups
                .entry((
                    record.assessment_year,
                    regime,
                    record.age_band.trim().to_ascii_uppercase(),
                ))
                .or_default()
                .push(record);
        }

        for ((assessment_year, regime, age_band), rows) in groups.iter_mut() {
            rows.sort_by(|a, b| a.min_income.cmp(&b.min_income));
            validate(*assessment_year, *regime, age_band, rows)?;
            age_bands(age_band)?;
        }

        let mut inserted = 0;
        for ((assessment_year, regime, age_band), rows) in &groups {
            repo.get_assessment_year_config(*assessment_year)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => {
                        TaxSlabLoaderError::AssessmentYearNotFound(*assessment_year)
                    }
                    other => TaxSlabLoaderError::Repository(other),
                })?;

            for band in age_bands(age_band)? {
                repo.delete_tax_slabs(*assessment_year, *regime, band).await?;
                for row in rows {
                    repo.insert_tax_slab(&TaxSlab {
                        assessment_year: *assessment_year,
                        regime: *regime,
                        age_band: band,
                        min_income: row.min_income,
                        max_income: row.max_income,
                        tax_rate: row.rate,
                        base_tax: row.base_tax,
                    })
                    .await?;
                    inserted += 1;
                }
                info!(
                    assessment_year,
                    %regime,
                    age_band = band.as_str(),
                    slabs = rows.len(),
                    "replaced slab table"
                );
            }
        }

        Ok(inserted)
    }
}

/// Checks one sorted group of rows.
fn validate(
    assessment_year: i32,
    regime: Regime,
    age_band: &str,
    rows: &[&TaxSlabRecord],
) -> Result<(), TaxSlabLoaderError> {
    let invalid = |reason: String| TaxSlabLoaderError::InvalidSchedule {
        assessment_year,
        regime: regime.to_string(),
        age_band: age_band.to_string(),
        reason,
    };

    let Some(first) = rows.first() else {
        return Ok(());
    };
    if !first.min_income.is_zero() {
        return Err(invalid(format!("first slab starts at {}", first.min_income)));
    }

    for pair in rows.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        match lower.max_income {
            Some(max) if max == upper.min_income => {}
            Some(max) => {
                return Err(invalid(format!(
                    "gap or overlap between {max} and {}",
                    upper.min_income
                )));
            }
            None => {
                return Err(invalid(format!(
                    "open slab at {} is not the last",
                    lower.min_income
                )));
            }
        }
    }

    for row in rows {
        if row.rate < Decimal::ZERO || row.rate > Decimal::ONE {
            return Err(invalid(format!("rate {} outside 0..=1", row.rate)));
        }
    }

    match rows.last().and_then(|r| r.max_income) {
        None => Ok(()),
        Some(max) => Err(invalid(format!("top slab is capped at {max}"))),
    }
}
