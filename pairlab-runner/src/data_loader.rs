//! Price loading and alignment for the runner.
//!
//! Each leg is a CSV file with a `close` column and an optional `date` column
//! (`YYYY-MM-DD`). Other columns are ignored. When both legs carry dates they
//! are inner-joined on date; otherwise they are aligned on their most recent
//! rows, which is what the engine does with unequal lengths anyway.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pairlab_core::domain::align_trailing;
use pairlab_core::fingerprint::dataset_hash;

/// Errors from the price loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read CSV from {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },
    #[error("{source_name}: missing '{column}' column")]
    MissingColumn {
        source_name: String,
        column: &'static str,
    },
    #[error("{source_name}, row {row}: cannot parse close '{value}'")]
    BadClose {
        source_name: String,
        row: usize,
        value: String,
    },
    #[error("{source_name}, row {row}: cannot parse date '{value}'")]
    BadDate {
        source_name: String,
        row: usize,
        value: String,
    },
}

/// One leg as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceColumn {
    pub dates: Option<Vec<NaiveDate>>,
    pub closes: Vec<f64>,
}

impl PriceColumn {
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Both legs, aligned and ready for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedPair {
    pub dates: Option<Vec<NaiveDate>>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    /// BLAKE3 over both aligned price vectors.
    pub dataset_hash: String,
    pub warnings: Vec<String>,
}

impl LoadedPair {
    /// Wrap two in-memory series, aligned on their trailing overlap.
    pub fn from_prices(a: &[f64], b: &[f64]) -> Self {
        let mut warnings = Vec::new();
        if a.len() != b.len() {
            warnings.push(format!(
                "leg lengths differ ({} vs {}), using the trailing {} points",
                a.len(),
                b.len(),
                a.len().min(b.len())
            ));
        }
        let (a, b) = align_trailing(a, b);
        Self {
            dates: None,
            dataset_hash: dataset_hash(a, b),
            a: a.to_vec(),
            b: b.to_vec(),
            warnings,
        }
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.first().copied())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.last().copied())
    }
}

/// Read one leg from any CSV source. `source_name` is used in errors only.
pub fn read_prices<R: Read>(reader: R, source_name: &str) -> Result<PriceColumn, LoadError> {
    let csv_err = |source| LoadError::Csv {
        source_name: source_name.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let close_idx = find("close").ok_or_else(|| LoadError::MissingColumn {
        source_name: source_name.to_string(),
        column: "close",
    })?;
    let date_idx = find("date");

    let mut closes = Vec::new();
    let mut dates = date_idx.map(|_| Vec::new());
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let row = i + 1;

        let raw = record.get(close_idx).unwrap_or_default();
        let close: f64 = raw.parse().map_err(|_| LoadError::BadClose {
            source_name: source_name.to_string(),
            row,
            value: raw.to_string(),
        })?;
        closes.push(close);

        if let (Some(idx), Some(dates)) = (date_idx, dates.as_mut()) {
            let raw = record.get(idx).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                LoadError::BadDate {
                    source_name: source_name.to_string(),
                    row,
                    value: raw.to_string(),
                }
            })?;
            dates.push(date);
        }
    }

    Ok(PriceColumn { dates, closes })
}

/// Read one leg from a file.
pub fn load_prices(path: &Path) -> Result<PriceColumn, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_prices(file, &path.display().to_string())
}

/// Align two legs: inner join on date when both have dates, trailing overlap
/// otherwise. A date column on only one leg is ignored with a warning.
pub fn align_pair(a: PriceColumn, b: PriceColumn) -> LoadedPair {
    let dated_leg = match (a.dates, b.dates) {
        (Some(dates_a), Some(dates_b)) => {
            return join_on_dates(
                dates_a.into_iter().zip(a.closes).collect(),
                dates_b.into_iter().zip(b.closes).collect(),
            )
        }
        (Some(_), None) => Some("A"),
        (None, Some(_)) => Some("B"),
        (None, None) => None,
    };

    let mut pair = LoadedPair::from_prices(&a.closes, &b.closes);
    if let Some(leg) = dated_leg {
        let warning =
            format!("only leg {leg} has a date column, aligning by position instead of date");
        tracing::warn!("{warning}");
        pair.warnings.insert(0, warning);
    }
    pair
}

fn join_on_dates(a: Vec<(NaiveDate, f64)>, b: Vec<(NaiveDate, f64)>) -> LoadedPair {
    let mut warnings = Vec::new();
    let (rows_a, rows_b) = (a.len(), b.len());

    // BTreeMap sorts by date; a repeated date keeps its last row.
    let a: BTreeMap<NaiveDate, f64> = a.into_iter().collect();
    let b: BTreeMap<NaiveDate, f64> = b.into_iter().collect();
    for (label, rows, unique) in [("A", rows_a, a.len()), ("B", rows_b, b.len())] {
        if unique < rows {
            warnings.push(format!(
                "leg {label}: {} duplicate date(s), kept the last row of each",
                rows - unique
            ));
        }
    }

    let mut dates = Vec::new();
    let mut prices_a = Vec::new();
    let mut prices_b = Vec::new();
    for (date, pa) in &a {
        if let Some(pb) = b.get(date) {
            dates.push(*date);
            prices_a.push(*pa);
            prices_b.push(*pb);
        }
    }

    let dropped = (a.len() - dates.len()) + (b.len() - dates.len());
    if dropped > 0 {
        warnings.push(format!(
            "{dropped} row(s) without a matching date on the other leg were dropped"
        ));
    }
    for w in &warnings {
        tracing::warn!("{w}");
    }

    LoadedPair {
        dataset_hash: dataset_hash(&prices_a, &prices_b),
        dates: Some(dates),
        a: prices_a,
        b: prices_b,
        warnings,
    }
}

/// Load and align both legs from disk.
pub fn load_pair(path_a: &Path, path_b: &Path) -> Result<LoadedPair, LoadError> {
    let a = load_prices(path_a)?;
    let b = load_prices(path_b)?;
    let loaded = align_pair(a, b);
    tracing::info!(
        a = %path_a.display(),
        b = %path_b.display(),
        points = loaded.len(),
        "loaded pair"
    );
    Ok(loaded)
}
