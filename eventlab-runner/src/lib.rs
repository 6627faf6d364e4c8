//! EventLab Runner: batch studies, configuration, import, reports, export.
//!
//! This crate builds on `eventlab-core` to provide:
//! - CSV import of returns, prices and Fama-French factors, plus synthetic data
//! - Event lists from CSV files or inline text
//! - Batch runs over an event list, in parallel, with error collection
//! - TOML study configuration with a content-addressed study id
//! - Results tables, CAR distribution and the batch error report
//! - CSV and JSON export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod events;
pub mod export;
pub mod report;

pub use batch::{run_batch, BatchError, BatchOptions};
pub use config::{ConfigError, StudyConfig, StudyId};
pub use data_loader::{
    import_fama_french, import_returns, synthetic_fama_french, synthetic_returns, ImportError,
    ReturnsImport,
};
pub use events::{events_from_csv, events_from_text, EventDescriptor};
pub use export::{export_car_distribution_csv, export_json, export_results_csv, save_artifacts};
pub use report::{car_distribution_table, error_report, Decimals, ResultsTable, Table};
