//! Window arithmetic around an event date.
//!
//! A study window is laid out as `[estimation | buffer | event]` on the row
//! axis of a return table. The event window is expressed in offsets relative
//! to the event row, both ends inclusive.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{EventStudyError, Result};

/// Relative period around the event date, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventWindow {
    pub start: i32,
    pub end: i32,
}

impl EventWindow {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if end < start {
            return Err(EventStudyError::InvalidWindow(format!(
                "event window end ({end}) is before its start ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of periods in the window: `end - start + 1`, zero when reversed.
    pub fn size(&self) -> usize {
        (i64::from(self.end) - i64::from(self.start) + 1).max(0) as usize
    }

    /// Relative event times covered by the window, in order.
    pub fn offsets(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        Self { start: -10, end: 10 }
    }
}

/// Full layout of one event study: event window plus the estimation and
/// buffer windows that precede it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub event_window: EventWindow,
    pub estimation_size: usize,
    pub buffer_size: usize,
}

impl WindowSpec {
    pub fn new(event_window: EventWindow, estimation_size: usize, buffer_size: usize) -> Result<Self> {
        let spec = Self {
            event_window,
            estimation_size,
            buffer_size,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Re-check invariants on a spec built literally or deserialized.
    pub fn validate(&self) -> Result<()> {
        EventWindow::new(self.event_window.start, self.event_window.end)?;
        if self.estimation_size == 0 {
            return Err(EventStudyError::InvalidWindow(
                "estimation size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn event_window_size(&self) -> usize {
        self.event_window.size()
    }

    /// Rows needed from the table: estimation + buffer + event window.
    pub fn total_span(&self) -> usize {
        self.estimation_size + self.buffer_size + self.event_window_size()
    }

    /// Row range `[start, end)` holding the study window for an event located
    /// at `event_index` in a table of `series_len` rows.
    ///
    /// Fails with `InvalidWindow` on a malformed spec, and with
    /// `InsufficientData` when the window does not fit, reporting the rows
    /// actually available against the expected span. `table` and `column`
    /// only label the error.
    pub fn slice_bounds(
        &self,
        series_len: usize,
        event_index: usize,
        table: &str,
        column: &str,
    ) -> Result<Range<usize>> {
        self.validate()?;
        let event_index = event_index as i64;
        let lead = self.estimation_size as i64 + self.buffer_size as i64
            - self.event_window.start as i64;
        let start = event_index - lead;
        let end = event_index + self.event_window.end as i64 + 1;
        let expected = self.total_span();

        if start < 0 || end > series_len as i64 {
            let available_end = end.min(series_len as i64);
            let available_start = start.max(0);
            let actual = (available_end - available_start).max(0) as usize;
            return Err(EventStudyError::InsufficientData {
                table: table.to_string(),
                column: column.to_string(),
                actual,
                expected,
            });
        }

        Ok(start as usize..end as usize)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            event_window: EventWindow::default(),
            estimation_size: 300,
            buffer_size: 30,
        }
    }
}
