//! CSV import of returns, prices and Fama-French factors.
//!
//! Files are column oriented: a `date` column plus one column per ticker or
//! factor. Blank cells are read as NaN. Imported tables go into a
//! `ReturnStore` under the names `returns` and `FamaFrench`.
//!
//! Synthetic returns are a developer-only mode for running the pipeline
//! without market data.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use eventlab_core::data::{FAMA_FRENCH, RETURNS};
use eventlab_core::{EventStudyError, ReturnTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

/// Name of the date column in every imported file.
pub const DATE_COLUMN: &str = "date";

/// Errors from the import layer.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Parse(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: cannot parse date '{value}' with format '{format}'")]
    BadDate {
        row: usize,
        value: String,
        format: String,
    },

    #[error("row {row}: cannot parse '{value}' in column '{column}'")]
    BadValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("no data rows")]
    Empty,

    #[error(transparent)]
    Table(#[from] EventStudyError),
}

/// How a returns file is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnsImport {
    /// The file holds prices to be converted to returns.
    pub is_price: bool,
    /// Log returns when converting prices, otherwise simple returns.
    pub log_return: bool,
    pub date_format: String,
}

impl Default for ReturnsImport {
    fn default() -> Self {
        Self {
            is_price: false,
            log_return: true,
            date_format: "%Y-%m-%d".into(),
        }
    }
}

/// Raw column-oriented content of a CSV file.
struct Columns {
    dates: Vec<NaiveDate>,
    values: Vec<(String, Vec<f64>)>,
}

fn read_columns<R: Read>(reader: R, date_format: &str) -> Result<Columns, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == DATE_COLUMN)
        .ok_or_else(|| ImportError::MissingColumn(DATE_COLUMN.into()))?;

    let mut dates = Vec::new();
    let mut values: Vec<(String, Vec<f64>)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .map(|(_, h)| (h.to_string(), Vec::new()))
        .collect();

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, date_format).map_err(|_| {
            ImportError::BadDate {
                row,
                value: raw_date.to_string(),
                format: date_format.to_string(),
            }
        })?;
        dates.push(date);

        let cells = record.iter().enumerate().filter(|(i, _)| *i != date_idx);
        for ((_, cell), (column, out)) in cells.zip(values.iter_mut()) {
            let v = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().map_err(|_| ImportError::BadValue {
                    row,
                    column: column.clone(),
                    value: cell.to_string(),
                })?
            };
            out.push(v);
        }
    }

    if dates.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(Columns { dates, values })
}

pub(crate) fn open(path: &Path) -> Result<std::fs::File, ImportError> {
    std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a price series to returns; the result is one shorter.
pub fn prices_to_returns(prices: &[f64], log_return: bool) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| {
            if log_return {
                w[1].ln() - w[0].ln()
            } else {
                (w[1] - w[0]) / w[0]
            }
        })
        .collect()
}

/// Parse a returns (or prices) table from any reader.
pub fn returns_from_reader<R: Read>(reader: R, opts: &ReturnsImport) -> Result<ReturnTable, ImportError> {
    let Columns { mut dates, values } = read_columns(reader, &opts.date_format)?;
    if opts.is_price {
        // the first date has no previous price
        dates.remove(0);
    }
    let mut table = ReturnTable::new(RETURNS, dates)?;
    for (name, series) in values {
        let series = if opts.is_price {
            prices_to_returns(&series, opts.log_return)
        } else {
            series
        };
        table.insert_column(name, series)?;
    }
    Ok(table)
}

/// Import security and market returns from a CSV file.
pub fn import_returns(path: &Path, opts: &ReturnsImport) -> Result<ReturnTable, ImportError> {
    let rdr = open(path)?;
    let table = returns_from_reader(rdr, opts)?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.column_names().count(),
        is_price = opts.is_price,
        "imported returns"
    );
    Ok(table)
}

/// Parse a Fama-French factor table from any reader.
///
/// With `rescale_factor`, every column is divided by 100 (the published
/// files quote factors in percent).
pub fn fama_french_from_reader<R: Read>(
    reader: R,
    rescale_factor: bool,
    date_format: &str,
) -> Result<ReturnTable, ImportError> {
    let Columns { dates, values } = read_columns(reader, date_format)?;
    let mut table = ReturnTable::new(FAMA_FRENCH, dates)?;
    for (name, mut series) in values {
        if rescale_factor {
            series.iter_mut().for_each(|v| *v /= 100.0);
        }
        table.insert_column(name, series)?;
    }
    Ok(table)
}

pub fn import_fama_french(
    path: &Path,
    rescale_factor: bool,
    date_format: &str,
) -> Result<ReturnTable, ImportError> {
    let rdr = open(path)?;
    let table = fama_french_from_reader(rdr, rescale_factor, date_format)?;
    debug!(path = %path.display(), rows = table.len(), "imported Fama-French factors");
    Ok(table)
}

fn business_days(start: NaiveDate, days: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(days);
    let mut current = start;
    while out.len() < days {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(current);
        }
        match current.checked_add_days(Days::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    out
}

fn rng_for(name: &str, seed: u64) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(&seed.to_le_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

/// Deterministic synthetic daily returns on business days.
///
/// The first ticker acts as the market; every other ticker loads on it with
/// a random beta plus idiosyncratic noise.
pub fn synthetic_returns(tickers: &[&str], start: NaiveDate, days: usize, seed: u64) -> Result<ReturnTable, ImportError> {
    let dates = business_days(start, days);
    let n = dates.len();
    let mut table = ReturnTable::new(RETURNS, dates)?;

    let Some((market_name, others)) = tickers.split_first() else {
        return Ok(table);
    };
    let mut rng = rng_for(market_name, seed);
    let market: Vec<f64> = (0..n).map(|_| rng.gen_range(-0.02..0.02)).collect();

    for ticker in others {
        let mut rng = rng_for(ticker, seed);
        let alpha = rng.gen_range(-0.0005..0.0005);
        let beta = rng.gen_range(0.5..1.5);
        let series = market
            .iter()
            .map(|m| alpha + beta * m + rng.gen_range(-0.01..0.01))
            .collect();
        table.insert_column(*ticker, series)?;
    }
    table.insert_column(*market_name, market)?;
    Ok(table)
}

/// Deterministic synthetic Fama-French factors (already rescaled) on business days.
pub fn synthetic_fama_french(start: NaiveDate, days: usize, seed: u64) -> Result<ReturnTable, ImportError> {
    let dates = business_days(start, days);
    let n = dates.len();
    let mut table = ReturnTable::new(FAMA_FRENCH, dates)?;
    for factor in ["Mkt-RF", "SMB", "HML", "RMW", "CMA"] {
        let mut rng = rng_for(factor, seed);
        table.insert_column(factor, (0..n).map(|_| rng.gen_range(-0.015..0.015)).collect())?;
    }
    table.insert_column("RF", vec![0.0001; n])?;
    Ok(table)
}
