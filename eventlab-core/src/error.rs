//! Structured error types for the event study engine.
//!
//! The first three variants are data-availability conditions raised while
//! resolving an event against imported return tables. They are the only
//! ones a batch run may collect and skip; everything else is fatal,
//! including `MissingParameter` (a table that was never imported).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventStudyError {
    #[error("date ({date}) is missing in parameter: {table}")]
    DateNotFound { date: NaiveDate, table: String },

    #[error("{column} is not available in parameter: {table}")]
    ColumnMissing { table: String, column: String },

    #[error(
        "some data are missing for ({column}) in '{table}': {actual} data retrieved over {expected} expected"
    )]
    InsufficientData {
        table: String,
        column: String,
        actual: usize,
        expected: usize,
    },

    #[error("parameter is missing: {name} (import or supply it first)")]
    MissingParameter { name: String },

    #[error("model '{model}' returned {field} of length {actual}, expected {expected}")]
    ModelShape {
        model: String,
        field: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("cannot aggregate an empty sample of events")]
    EmptySample,

    #[error(
        "event {index} has event window ({start}, {end}) but the sample uses ({expected_start}, {expected_end})"
    )]
    MismatchedEventWindow {
        index: usize,
        start: i32,
        end: i32,
        expected_start: i32,
        expected_end: i32,
    },

    #[error("duplicate date {date} in table '{table}'")]
    DuplicateDate { table: String, date: NaiveDate },

    #[error("column '{column}' in table '{table}' has {actual} values but the date axis has {expected}")]
    ColumnLength {
        table: String,
        column: String,
        actual: usize,
        expected: usize,
    },

    #[error("dates in table '{table}' are not in ascending order at row {row}")]
    UnsortedDates { table: String, row: usize },

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("regression failed: {0}")]
    Regression(String),
}

/// Discriminant of an [`EventStudyError`], stored in error records and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    DateNotFound,
    ColumnMissing,
    InsufficientData,
    MissingParameter,
    ModelShape,
    EmptySample,
    MismatchedEventWindow,
    DuplicateDate,
    ColumnLength,
    UnsortedDates,
    InvalidWindow,
    Regression,
}

impl ErrorKind {
    /// True for the kinds a batch may collect and continue past.
    pub fn is_data_availability(self) -> bool {
        matches!(
            self,
            ErrorKind::DateNotFound | ErrorKind::ColumnMissing | ErrorKind::InsufficientData
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::DateNotFound => "DateNotFound",
            ErrorKind::ColumnMissing => "ColumnMissing",
            ErrorKind::InsufficientData => "InsufficientData",
            ErrorKind::MissingParameter => "MissingParameter",
            ErrorKind::ModelShape => "ModelShape",
            ErrorKind::EmptySample => "EmptySample",
            ErrorKind::MismatchedEventWindow => "MismatchedEventWindow",
            ErrorKind::DuplicateDate => "DuplicateDate",
            ErrorKind::ColumnLength => "ColumnLength",
            ErrorKind::UnsortedDates => "UnsortedDates",
            ErrorKind::InvalidWindow => "InvalidWindow",
            ErrorKind::Regression => "Regression",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl EventStudyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventStudyError::DateNotFound { .. } => ErrorKind::DateNotFound,
            EventStudyError::ColumnMissing { .. } => ErrorKind::ColumnMissing,
            EventStudyError::InsufficientData { .. } => ErrorKind::InsufficientData,
            EventStudyError::MissingParameter { .. } => ErrorKind::MissingParameter,
            EventStudyError::ModelShape { .. } => ErrorKind::ModelShape,
            EventStudyError::EmptySample => ErrorKind::EmptySample,
            EventStudyError::MismatchedEventWindow { .. } => ErrorKind::MismatchedEventWindow,
            EventStudyError::DuplicateDate { .. } => ErrorKind::DuplicateDate,
            EventStudyError::ColumnLength { .. } => ErrorKind::ColumnLength,
            EventStudyError::UnsortedDates { .. } => ErrorKind::UnsortedDates,
            EventStudyError::InvalidWindow(_) => ErrorKind::InvalidWindow,
            EventStudyError::Regression(_) => ErrorKind::Regression,
        }
    }

    pub fn is_data_availability(&self) -> bool {
        self.kind().is_data_availability()
    }
}

pub type Result<T> = std::result::Result<T, EventStudyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_three_kinds_are_recoverable() {
        let recoverable: Vec<ErrorKind> = [
            ErrorKind::DateNotFound,
            ErrorKind::ColumnMissing,
            ErrorKind::InsufficientData,
            ErrorKind::MissingParameter,
            ErrorKind::ModelShape,
            ErrorKind::EmptySample,
            ErrorKind::MismatchedEventWindow,
            ErrorKind::DuplicateDate,
            ErrorKind::ColumnLength,
            ErrorKind::UnsortedDates,
            ErrorKind::InvalidWindow,
            ErrorKind::Regression,
        ]
        .into_iter()
        .filter(|k| k.is_data_availability())
        .collect();

        assert_eq!(
            recoverable,
            vec![
                ErrorKind::DateNotFound,
                ErrorKind::ColumnMissing,
                ErrorKind::InsufficientData
            ]
        );
    }

    #[test]
    fn insufficient_data_message_reports_sizes() {
        let err = EventStudyError::InsufficientData {
            table: "returns".into(),
            column: "AAPL".into(),
            actual: 12,
            expected: 351,
        };
        let msg = err.to_string();
        assert!(msg.contains("12 data retrieved over 351 expected"), "{msg}");
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }
}
