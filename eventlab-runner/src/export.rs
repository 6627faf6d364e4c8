//! Export of study results: CSV tables and full JSON.
//!
//! CSV exports keep full precision and no significance markers, so the
//! files can be read back for further computation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eventlab_core::MultipleEvents;
use serde::Serialize;

use crate::report::{car_distribution_table, Decimals, ResultsTable, Table};

/// Column header of the relative event time in CSV exports.
pub const EVENT_TIME: &str = "event_time";

// ─── CSV export ─────────────────────────────────────────────────────

fn table_csv(table: &Table) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![EVENT_TIME.to_string()];
    header.extend(table.headers.iter().cloned());
    wtr.write_record(&header)?;

    for (t, row) in table.index.iter().zip(&table.rows) {
        let mut record = vec![t.to_string()];
        record.extend(row.iter().cloned());
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Results table of a single event or an aggregate, one row per event time.
pub fn export_results_csv<R: ResultsTable>(results: &R) -> Result<String> {
    table_csv(&results.results_table(false, &Decimals::Full))
}

pub fn export_car_distribution_csv(events: &MultipleEvents) -> Result<String> {
    table_csv(&car_distribution_table(events, &Decimals::Full))
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize any result (single event, aggregate, config) to pretty JSON.
pub fn export_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize results to JSON")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the artifact set of a batch study into `output_dir/{study_id}/`:
/// - `results.json`: the full aggregate, including each event
/// - `results.csv`: AAR / CAAR table
/// - `car_distribution.csv`
/// - `errors.txt`: the error report
///
/// Returns the created directory.
pub fn save_artifacts(events: &MultipleEvents, study_id: &str, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(study_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let write = |name: &str, content: String| -> Result<()> {
        let path = run_dir.join(name);
        std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
    };
    write("results.json", export_json(events)?)?;
    write("results.csv", export_results_csv(events)?)?;
    write("car_distribution.csv", export_car_distribution_csv(events)?)?;
    write("errors.txt", crate::report::error_report(events.errors()))?;

    Ok(run_dir)
}
