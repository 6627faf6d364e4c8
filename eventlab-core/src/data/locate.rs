//! Event-date lookup with forward probing over non-trading days.

use chrono::{Days, NaiveDate};

/// Default number of extra calendar days probed after a missing event date.
pub const DEFAULT_MAX_PROBE_DAYS: u32 = 4;

/// A successful lookup: the matched row and how many days were skipped to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub index: usize,
    pub probed_days: u32,
}

/// Find the row of `target` in an ascending date axis.
///
/// If `target` is absent, retries with `target + 1 day`, up to `max_probe`
/// additional days. Returns the first occurrence in index order.
pub fn locate(dates: &[NaiveDate], target: NaiveDate, max_probe: u32) -> Option<Located> {
    let mut date = target;
    for probed_days in 0..=max_probe {
        let index = dates.partition_point(|d| *d < date);
        if dates.get(index) == Some(&date) {
            return Some(Located { index, probed_days });
        }
        date = date.checked_add_days(Days::new(1))?;
    }
    None
}
