//! Column-oriented return tables keyed by date.
//!
//! A table has one strictly ascending date axis and any number of named
//! value columns (tickers or factors), each the same length as the axis.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EventStudyError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    name: String,
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl ReturnTable {
    /// Create an empty table over a date axis.
    ///
    /// Dates must be strictly ascending: a repeated date would make the
    /// event row ambiguous, so it is rejected here rather than at lookup.
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>) -> Result<Self> {
        let name = name.into();
        for (row, pair) in dates.windows(2).enumerate() {
            if pair[1] == pair[0] {
                return Err(EventStudyError::DuplicateDate {
                    table: name,
                    date: pair[1],
                });
            }
            if pair[1] < pair[0] {
                return Err(EventStudyError::UnsortedDates {
                    table: name,
                    row: row + 1,
                });
            }
        }
        Ok(Self {
            name,
            dates,
            columns: BTreeMap::new(),
        })
    }

    /// Add or replace a column.
    pub fn insert_column(&mut self, column: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let column = column.into();
        if values.len() != self.dates.len() {
            return Err(EventStudyError::ColumnLength {
                table: self.name.clone(),
                column,
                actual: values.len(),
                expected: self.dates.len(),
            });
        }
        self.columns.insert(column, values);
        Ok(())
    }

    /// Builder form of [`insert_column`](Self::insert_column).
    pub fn with_column(mut self, column: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert_column(column, values)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn column(&self, column: &str) -> Result<&[f64]> {
        self.columns
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| EventStudyError::ColumnMissing {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Values of `column` over a row range, checked against the table length.
    pub fn slice(&self, column: &str, rows: Range<usize>) -> Result<&[f64]> {
        let values = self.column(column)?;
        let expected = rows.len();
        values
            .get(rows.clone())
            .ok_or_else(|| EventStudyError::InsufficientData {
                table: self.name.clone(),
                column: column.to_string(),
                actual: values.len().saturating_sub(rows.start).min(expected),
                expected,
            })
    }
}
