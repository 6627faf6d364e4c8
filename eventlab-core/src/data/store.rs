//! Explicit store of imported return tables.
//!
//! Replaces a process-wide parameter dictionary: each study receives the
//! store it reads from, so tests and concurrent batches can use distinct
//! datasets. A populated store is only read during a run and is shared by
//! `&` reference across worker threads.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use super::locate::{locate, Located, DEFAULT_MAX_PROBE_DAYS};
use super::series::ReturnTable;
use crate::error::{EventStudyError, Result};
use crate::window::WindowSpec;

/// Table name for security and market returns.
pub const RETURNS: &str = "returns";
/// Table name for Fama-French factors.
pub const FAMA_FRENCH: &str = "FamaFrench";

#[derive(Debug, Clone)]
pub struct ReturnStore {
    tables: HashMap<String, ReturnTable>,
    max_probe_days: u32,
}

/// Columns of one table cut to a study window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlice {
    pub located: Located,
    /// Date of the matched event row (may be later than the requested date).
    pub event_row_date: NaiveDate,
    /// One vector per requested column, in request order.
    pub columns: Vec<Vec<f64>>,
}

impl ReturnStore {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            max_probe_days: DEFAULT_MAX_PROBE_DAYS,
        }
    }

    pub fn with_max_probe_days(mut self, days: u32) -> Self {
        self.max_probe_days = days;
        self
    }

    /// Insert a table under its own name, replacing any previous import.
    pub fn insert(&mut self, table: ReturnTable) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn table(&self, name: &str) -> Result<&ReturnTable> {
        self.tables
            .get(name)
            .ok_or_else(|| EventStudyError::MissingParameter {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Locate `event_date` in `table` and cut each of `columns` to the study window.
    ///
    /// Errors, in the order they are checked: `InvalidWindow` (malformed
    /// spec), `MissingParameter` (table not imported), `DateNotFound` (date and probe days absent),
    /// `ColumnMissing`, `InsufficientData` (window does not fit).
    pub fn window(
        &self,
        table: &str,
        columns: &[&str],
        event_date: NaiveDate,
        spec: &WindowSpec,
    ) -> Result<WindowSlice> {
        spec.validate()?;
        let data = self.table(table)?;
        let located = locate(data.dates(), event_date, self.max_probe_days).ok_or_else(|| {
            EventStudyError::DateNotFound {
                date: event_date,
                table: table.to_string(),
            }
        })?;

        let mut out = Vec::with_capacity(columns.len());
        for column in columns {
            // column presence is checked before window length
            if !data.has_column(column) {
                return Err(EventStudyError::ColumnMissing {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            }
            let rows = spec.slice_bounds(data.len(), located.index, table, column)?;
            debug!(
                table,
                column,
                event_index = located.index,
                probed_days = located.probed_days,
                start = rows.start,
                end = rows.end,
                "sliced study window"
            );
            out.push(data.slice(column, rows)?.to_vec());
        }

        Ok(WindowSlice {
            located,
            event_row_date: data.dates()[located.index],
            columns: out,
        })
    }
}

impl Default for ReturnStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::EventWindow;
    use chrono::Days;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    /// Daily table with a gap of `gap` days after row `gap_at`.
    fn table(rows: usize, gap_at: usize, gap: u64) -> ReturnTable {
        let mut dates = Vec::with_capacity(rows);
        let mut offset = 0u64;
        for i in 0..rows {
            if i == gap_at {
                offset += gap;
            }
            dates.push(base().checked_add_days(Days::new(i as u64 + offset)).unwrap());
        }
        let values: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        ReturnTable::new(RETURNS, dates)
            .unwrap()
            .with_column("AAPL", values.clone())
            .unwrap()
            .with_column("SPY", values)
            .unwrap()
    }

    fn spec() -> WindowSpec {
        WindowSpec::new(EventWindow::new(-1, 1).unwrap(), 5, 2).unwrap()
    }

    #[test]
    fn insert_keys_tables_by_name() {
        let mut store = ReturnStore::new();
        assert!(!store.contains(RETURNS));
        store.insert(table(5, 0, 0));
        assert!(store.contains(RETURNS));
        assert!(!store.contains(FAMA_FRENCH));
    }

    #[test]
    fn missing_table_is_missing_parameter() {
        let store = ReturnStore::new();
        let err = store.window(RETURNS, &["AAPL"], base(), &spec()).unwrap_err();
        assert!(matches!(err, EventStudyError::MissingParameter { .. }));
    }

    #[test]
    fn reversed_spec_is_invalid_window() {
        let mut store = ReturnStore::new();
        store.insert(table(30, 0, 0));
        let reversed = WindowSpec {
            event_window: EventWindow { start: 3, end: -3 },
            estimation_size: 10,
            buffer_size: 0,
        };
        let event = base().checked_add_days(Days::new(20)).unwrap();
        let err = store.window(RETURNS, &["AAPL"], event, &reversed).unwrap_err();
        assert!(matches!(err, EventStudyError::InvalidWindow(_)));
    }

    #[test]
    fn window_columns_follow_request_order() {
        let mut store = ReturnStore::new();
        store.insert(table(30, 0, 0));
        let event = base().checked_add_days(Days::new(20)).unwrap();
        let w = store.window(RETURNS, &["SPY", "AAPL"], event, &spec()).unwrap();
        assert_eq!(w.located.index, 20);
        assert_eq!(w.columns.len(), 2);
        assert_eq!(w.columns[0].len(), spec().total_span());
        // rows 20 - (5 + 2 + 1) ..= 21
        assert_eq!(w.columns[0][0], 12.0);
        assert_eq!(*w.columns[0].last().unwrap(), 21.0);
    }

    #[test]
    fn probed_event_reports_matched_row_date() {
        let mut store = ReturnStore::new();
        // rows 0..15 are consecutive, row 15 starts after a 2-day gap
        store.insert(table(30, 15, 2));
        let requested = base().checked_add_days(Days::new(15)).unwrap();
        let w = store.window(RETURNS, &["AAPL"], requested, &spec()).unwrap();
        assert_eq!(w.located.index, 15);
        assert_eq!(w.located.probed_days, 2);
        assert_eq!(w.event_row_date, base().checked_add_days(Days::new(17)).unwrap());
    }

    #[test]
    fn probe_limit_comes_from_store() {
        let mut store = ReturnStore::new().with_max_probe_days(1);
        store.insert(table(30, 15, 2));
        let requested = base().checked_add_days(Days::new(15)).unwrap();
        let err = store.window(RETURNS, &["AAPL"], requested, &spec()).unwrap_err();
        assert!(matches!(err, EventStudyError::DateNotFound { .. }));
    }

    #[test]
    fn unknown_column_is_column_missing() {
        let mut store = ReturnStore::new();
        store.insert(table(30, 0, 0));
        let event = base().checked_add_days(Days::new(20)).unwrap();
        let err = store.window(RETURNS, &["MSFT"], event, &spec()).unwrap_err();
        assert!(matches!(err, EventStudyError::ColumnMissing { .. }));
    }

    #[test]
    fn early_event_is_insufficient_data() {
        let mut store = ReturnStore::new();
        store.insert(table(30, 0, 0));
        let event = base().checked_add_days(Days::new(3)).unwrap();
        let err = store.window(RETURNS, &["AAPL"], event, &spec()).unwrap_err();
        assert!(matches!(
            err,
            EventStudyError::InsufficientData { expected: 10, .. }
        ));
    }
}
