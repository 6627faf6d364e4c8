//! Event lists: one descriptor per event, read from CSV or inline text.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data_loader::{open, ImportError};

pub const SECURITY_TICKER: &str = "security_ticker";
pub const MARKET_TICKER: &str = "market_ticker";
pub const EVENT_DATE: &str = "event_date";

/// Parameters of one requested event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub security_ticker: String,
    pub market_ticker: Option<String>,
    pub event_date: NaiveDate,
    /// Columns the runner does not interpret, kept for the error report.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl EventDescriptor {
    pub fn new(security_ticker: impl Into<String>, event_date: NaiveDate) -> Self {
        Self {
            security_ticker: security_ticker.into(),
            market_ticker: None,
            event_date,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_market(mut self, market_ticker: impl Into<String>) -> Self {
        self.market_ticker = Some(market_ticker.into());
        self
    }

    /// Every parameter except the event date, by name.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = self.extra.clone();
        params.insert(SECURITY_TICKER.into(), self.security_ticker.clone());
        if let Some(market) = &self.market_ticker {
            params.insert(MARKET_TICKER.into(), market.clone());
        }
        params
    }
}

/// Parse events from any CSV reader with a header row.
pub fn events_from_reader<R: Read>(reader: R, date_format: &str) -> Result<Vec<EventDescriptor>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let security_idx = find(SECURITY_TICKER).ok_or_else(|| ImportError::MissingColumn(SECURITY_TICKER.into()))?;
    let date_idx = find(EVENT_DATE).ok_or_else(|| ImportError::MissingColumn(EVENT_DATE.into()))?;
    let market_idx = find(MARKET_TICKER);

    let mut events = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let event_date = NaiveDate::parse_from_str(raw_date, date_format).map_err(|_| {
            ImportError::BadDate {
                row,
                value: raw_date.to_string(),
                format: date_format.to_string(),
            }
        })?;

        let extra = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != security_idx && *i != date_idx && Some(*i) != market_idx)
            .map(|(_, (h, v))| (h.to_string(), v.to_string()))
            .collect();

        events.push(EventDescriptor {
            security_ticker: record.get(security_idx).unwrap_or_default().to_string(),
            market_ticker: market_idx
                .and_then(|i| record.get(i))
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            event_date,
            extra,
        });
    }
    Ok(events)
}

/// Parse events from text: a comma-separated header line, then one event per line.
///
/// Blank lines are skipped.
pub fn events_from_text(text: &str, date_format: &str) -> Result<Vec<EventDescriptor>, ImportError> {
    let cleaned: String = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    events_from_reader(cleaned.as_bytes(), date_format)
}

pub fn events_from_csv(path: &Path, date_format: &str) -> Result<Vec<EventDescriptor>, ImportError> {
    events_from_reader(open(path)?, date_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_inline_text() {
        let text = "
            security_ticker, market_ticker, event_date
            AAPL, SPY, 2007-01-09
            AAPL, SPY, 2008-01-15
        ";
        let events = events_from_text(text, "%Y-%m-%d").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].security_ticker, "AAPL");
        assert_eq!(events[0].market_ticker.as_deref(), Some("SPY"));
        assert_eq!(events[1].event_date, d(2008, 1, 15));
        assert!(events[0].extra.is_empty());
    }

    #[test]
    fn market_ticker_is_optional() {
        let text = "event_date,security_ticker\n20200302,MSFT\n";
        let events = events_from_text(text, "%Y%m%d").unwrap();
        assert_eq!(events[0].market_ticker, None);
        assert_eq!(events[0].event_date, d(2020, 3, 2));
    }

    #[test]
    fn unknown_columns_are_kept() {
        let text = "security_ticker,event_date,note\nAAPL,2007-01-09,iphone\n";
        let events = events_from_text(text, "%Y-%m-%d").unwrap();
        assert_eq!(events[0].extra.get("note").map(String::as_str), Some("iphone"));
        let params = events[0].parameters();
        assert_eq!(params.get("note").map(String::as_str), Some("iphone"));
        assert_eq!(params.get(SECURITY_TICKER).map(String::as_str), Some("AAPL"));
    }

    #[test]
    fn missing_security_column_is_rejected() {
        let text = "ticker,event_date\nAAPL,2007-01-09\n";
        assert!(matches!(
            events_from_text(text, "%Y-%m-%d"),
            Err(ImportError::MissingColumn(c)) if c == SECURITY_TICKER
        ));
    }
}
