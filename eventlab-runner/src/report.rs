//! Text reports: results tables, CAR distribution and the batch error report.

use std::fmt;

use eventlab_core::{ErrorRecord, MultipleEvents, SingleEvent};

/// Rounding applied to table cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decimals {
    /// Shortest exact representation.
    Full,
    Uniform(usize),
    /// One entry per column; missing entries fall back to full precision.
    PerColumn(Vec<usize>),
}

impl Default for Decimals {
    fn default() -> Self {
        Decimals::Uniform(3)
    }
}

impl Decimals {
    fn for_column(&self, column: usize) -> Option<usize> {
        match self {
            Decimals::Full => None,
            Decimals::Uniform(d) => Some(*d),
            Decimals::PerColumn(ds) => ds.get(column).copied(),
        }
    }
}

fn format_value(value: f64, decimals: Option<usize>) -> String {
    if value.is_nan() {
        return "NaN".into();
    }
    match decimals {
        Some(d) => format!("{value:.d$}"),
        None => format!("{value}"),
    }
}

/// Significance marker for a p-value: `***` below 0.01, `**` below 0.05, `*` below 0.10.
pub fn significance_stars(p_value: f64) -> &'static str {
    if p_value < 0.01 {
        "***"
    } else if p_value < 0.05 {
        "**"
    } else if p_value < 0.1 {
        "*"
    } else {
        ""
    }
}

fn with_stars(cell: String, p_value: f64) -> String {
    match significance_stars(p_value) {
        "" => cell,
        stars => format!("{cell} {stars}"),
    }
}

/// A formatted table indexed by relative event time.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub index: Vec<i32>,
    /// Row-major cells, one row per index entry.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build from named numeric columns of equal length.
    fn from_columns(index_start: i32, columns: &[(&str, &[f64])], decimals: &Decimals) -> Self {
        let len = columns.first().map_or(0, |(_, values)| values.len());
        let rows = (0..len)
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(c, (_, values))| {
                        format_value(values.get(row).copied().unwrap_or(f64::NAN), decimals.for_column(c))
                    })
                    .collect()
            })
            .collect();
        Self {
            headers: columns.iter().map(|(name, _)| name.to_string()).collect(),
            index: (0..len as i32).map(|i| index_start + i).collect(),
            rows,
        }
    }

    fn column_position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append significance stars to `target`, reading p-values from `p_values`.
    fn mark_significance(&mut self, target: &str, p_values: &[f64]) {
        let Some(col) = self.column_position(target) else {
            return;
        };
        for (row, p) in self.rows.iter_mut().zip(p_values) {
            let cell = std::mem::take(&mut row[col]);
            row[col] = with_stars(cell, *p);
        }
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let col = self.column_position(name)?;
        Some(self.rows.iter().map(|r| r[col].as_str()).collect())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index_width = self.index.iter().map(|i| i.to_string().len()).max().unwrap_or(0);
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(c, h)| {
                self.rows
                    .iter()
                    .map(|r| r[c].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (h, w) in self.headers.iter().zip(&widths) {
            write!(f, "  {h:>w$}")?;
        }
        for (i, row) in self.index.iter().zip(&self.rows) {
            write!(f, "\n{i:>index_width$}")?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {cell:>w$}")?;
            }
        }
        Ok(())
    }
}

/// Results that can be laid out as a table per relative event time.
pub trait ResultsTable {
    fn results_table(&self, asterisks: bool, decimals: &Decimals) -> Table;
}

impl ResultsTable for SingleEvent {
    /// AR, Std. E. AR, CAR, Std. E. CAR, T-stat, P-value.
    fn results_table(&self, asterisks: bool, decimals: &Decimals) -> Table {
        let std_ar: Vec<f64> = self.var_ar().iter().map(|v| v.sqrt()).collect();
        let std_car: Vec<f64> = self.var_car().iter().map(|v| v.sqrt()).collect();
        let mut table = Table::from_columns(
            self.event_window().start,
            &[
                ("AR", self.ar()),
                ("Std. E. AR", std_ar.as_slice()),
                ("CAR", self.car()),
                ("Std. E. CAR", std_car.as_slice()),
                ("T-stat", self.t_stat()),
                ("P-value", self.p_value()),
            ],
            decimals,
        );
        if asterisks {
            table.mark_significance("CAR", self.p_value());
        }
        table
    }
}

impl ResultsTable for MultipleEvents {
    /// AAR, Variance AAR, CAAR, Variance CAAR, T-stat, P-value.
    fn results_table(&self, asterisks: bool, decimals: &Decimals) -> Table {
        let mut table = Table::from_columns(
            self.event_window().start,
            &[
                ("AAR", self.aar()),
                ("Variance AAR", self.var_aar()),
                ("CAAR", self.caar()),
                ("Variance CAAR", self.var_caar()),
                ("T-stat", self.t_stat()),
                ("P-value", self.p_value()),
            ],
            decimals,
        );
        if asterisks {
            table.mark_significance("CAAR", self.p_value());
        }
        table
    }
}

/// Cross-sectional CAR statistics per relative event time.
pub fn car_distribution_table(events: &MultipleEvents, decimals: &Decimals) -> Table {
    Table::from_columns(
        events.event_window().start,
        &events.car_distribution().columns(),
        decimals,
    )
}

const ERROR_REPORT_HELP: &str = "\
The respective events were not processed and thus removed from the sample.
It does not affect the computation of other events.

Help 1: Check if the company was quoted at this date.
Help 2: For event studies using Fama-French models,
        check if the imported Fama-French dataset is up-to-date.
Tips:   Re-import all parameters and re-run the event study analysis.

Details
=======
(You can find more details on errors in the documentation.)

";

/// `"N events have not been processed due to data issues."`, or `None` without errors.
pub fn unprocessed_summary(errors: &[ErrorRecord]) -> Option<String> {
    match errors.len() {
        0 => None,
        1 => Some("One event has not been processed due to data issues.".into()),
        n => Some(format!("{n} events have not been processed due to data issues.")),
    }
}

/// Human-readable report of events skipped in a batch, aligned into columns.
///
/// Each entry shows the error kind, the event date and the parameters the
/// event was requested with, followed by the error detail.
pub fn error_report(errors: &[ErrorRecord]) -> String {
    if errors.is_empty() {
        return "No error.".into();
    }

    let count = if errors.len() == 1 {
        "One error".to_string()
    } else {
        format!("{} errors", errors.len())
    };
    let mut report = format!(
        "Error Report\n============\n\n{count} due to data unavailability.\n{ERROR_REPORT_HELP}"
    );

    struct Cells {
        kind: String,
        date: String,
        detail: String,
        parameters: String,
    }

    let cells: Vec<Cells> = errors
        .iter()
        .map(|e| Cells {
            kind: e.kind.name().to_string(),
            date: e.event_date.map_or_else(|| "-".to_string(), |d| d.to_string()),
            detail: e.detail.clone(),
            parameters: e
                .parameters
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; "),
        })
        .collect();

    let kind_w = cells.iter().map(|c| c.kind.chars().count()).fold(5, usize::max);
    let date_w = cells.iter().map(|c| c.date.chars().count()).fold(5, usize::max);
    let params_w = cells
        .iter()
        .map(|c| c.parameters.chars().count())
        .fold(11, usize::max);

    let header = format!("{:<kind_w$}{:<date_w$}{:<params_w$}\n", "Error", " Date", "  Parameters");
    let mid_rule = format!("{} {} {}", "-".repeat(kind_w), "-".repeat(date_w), "-".repeat(params_w));

    report.push_str(&header);
    report.push_str(&mid_rule);
    for c in &cells {
        report.push_str(&format!(
            "\n{:<kind_w$} {:<date_w$} {:<params_w$}\nDescription: {}\n",
            c.kind, c.date, c.parameters, c.detail
        ));
    }
    report.push_str(&mid_rule);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use eventlab_core::models::{ModelData, ModelOutput, ModelSizes};
    use eventlab_core::{
        EventOptions, EventStudyError, EventWindow, ErrorKind, Result, WindowSpec,
    };
    use std::collections::BTreeMap;

    fn event(ar: Vec<f64>, var: f64) -> SingleEvent {
        let spec = WindowSpec::new(EventWindow::new(-1, 1).unwrap(), 10, 0).unwrap();
        let model = move |_: &ModelData, _: &ModelSizes| -> Result<ModelOutput> {
            Ok(ModelOutput {
                variance: vec![var; ar.len()],
                residuals: ar.clone(),
                df: 9,
                fitted: None,
            })
        };
        SingleEvent::new(&model, &ModelData::new(), &spec, EventOptions::default()).unwrap()
    }

    #[test]
    fn stars_follow_thresholds() {
        assert_eq!(significance_stars(0.001), "***");
        assert_eq!(significance_stars(0.03), "**");
        assert_eq!(significance_stars(0.07), "*");
        assert_eq!(significance_stars(0.5), "");
        assert_eq!(significance_stars(f64::NAN), "");
    }

    #[test]
    fn single_table_is_indexed_by_event_time() {
        let e = event(vec![0.5, 0.25, -0.25], 0.0001);
        let t = e.results_table(false, &Decimals::Uniform(2));
        assert_eq!(t.index, vec![-1, 0, 1]);
        assert_eq!(t.headers[2], "CAR");
        assert_eq!(t.column("CAR").unwrap(), vec!["0.50", "0.75", "0.50"]);
        assert_eq!(t.column("Std. E. AR").unwrap(), vec!["0.01"; 3]);
    }

    #[test]
    fn asterisks_mark_significant_car() {
        let e = event(vec![0.5, 0.0, -0.5], 0.0001);
        let t = e.results_table(true, &Decimals::Uniform(1));
        let car = t.column("CAR").unwrap();
        assert_eq!(car[0], "0.5 ***");
        assert_eq!(car[2], "0.0");
    }

    #[test]
    fn per_column_decimals() {
        let e = event(vec![0.123456, 0.0, 0.0], 0.0001);
        let t = e.results_table(false, &Decimals::PerColumn(vec![4, 1]));
        assert_eq!(t.rows[0][0], "0.1235");
        assert_eq!(t.rows[0][1], "0.0");
        assert_eq!(t.rows[0][2], "0.123456");
    }

    #[test]
    fn display_aligns_columns() {
        let e = event(vec![0.5, 0.25, -0.25], 0.0001);
        let text = e.results_table(false, &Decimals::Uniform(3)).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        let width = lines[0].len();
        assert!(lines.iter().all(|l| l.len() == width), "{text}");
        assert!(lines[1].starts_with("-1"));
    }

    #[test]
    fn aggregate_table_and_distribution() {
        let m = MultipleEvents::new(
            vec![event(vec![0.5, 0.25, 0.0], 0.0001), event(vec![0.25, 0.25, 0.0], 0.0001)],
            vec![],
        )
        .unwrap();
        let t = m.results_table(false, &Decimals::Uniform(3));
        assert_eq!(t.column("AAR").unwrap(), vec!["0.375", "0.250", "0.000"]);
        let d = car_distribution_table(&m, &Decimals::Uniform(3));
        assert_eq!(d.headers.len(), 9);
        assert_eq!(d.column("Max").unwrap()[0], "0.500");
    }

    #[test]
    fn empty_error_report() {
        assert_eq!(error_report(&[]), "No error.");
        assert_eq!(unprocessed_summary(&[]), None);
    }

    #[test]
    fn error_report_layout() {
        let err = EventStudyError::DateNotFound {
            date: NaiveDate::from_ymd_opt(2020, 1, 4).unwrap(),
            table: "returns".into(),
        };
        let mut params = BTreeMap::new();
        params.insert("security_ticker".to_string(), "AAPL".to_string());
        params.insert("market_ticker".to_string(), "SPY".to_string());
        let record = ErrorRecord::new(&err, NaiveDate::from_ymd_opt(2020, 1, 4), params);
        assert_eq!(record.kind, ErrorKind::DateNotFound);

        let report = error_report(&[record]);
        assert!(report.starts_with("Error Report\n============\n\nOne error due to data unavailability.\n"));

        let parameters = "market_ticker: SPY; security_ticker: AAPL";
        let rule = format!("{} {} {}", "-".repeat(12), "-".repeat(10), "-".repeat(parameters.len()));
        let header = format!("{:<12}{:<10}{:<w$}\n", "Error", " Date", "  Parameters", w = parameters.len());
        let row = format!(
            "\nDateNotFound 2020-01-04 {parameters}\nDescription: {}\n",
            err
        );
        assert!(report.ends_with(&format!("{header}{rule}{row}{rule}")), "{report}");
        assert_eq!(
            unprocessed_summary(&[ErrorRecord::new(&err, None, BTreeMap::new())]).as_deref(),
            Some("One event has not been processed due to data issues.")
        );
    }
}
