//! Forcing time series.

use chrono::{NaiveDateTime, TimeDelta};
use hf_components::VariableKind;
use hf_project::{ForcingSeriesDef, SeriesValues};

use crate::error::{BuildError, BuildResult};

/// Supplier of one scalar per unit and per time step.
///
/// The cursor starts unset. `set_cursor_to_date` arms it so that the next
/// `advance_one_time_step` makes that date current; each further advance
/// moves one step forward.
pub trait TimeSeries {
    fn variable_kind(&self) -> VariableKind;

    fn set_cursor_to_date(&mut self, date: NaiveDateTime) -> bool;

    /// Returns false once the data is exhausted.
    fn advance_one_time_step(&mut self) -> bool;

    /// Current value for a unit (by unit position), if any.
    fn value(&self, unit_index: usize) -> Option<f64>;

    fn start(&self) -> NaiveDateTime;

    fn end(&self) -> NaiveDateTime;

    /// Whether each unit has its own column.
    fn is_distributed(&self) -> bool;

    /// Whether the series provides data for the unit at `unit_index`.
    fn covers_unit(&self, unit_index: usize) -> bool;
}

/// Regularly sampled series, shared by all units or one column per unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTimeSeries {
    kind: VariableKind,
    start: NaiveDateTime,
    step: TimeDelta,
    columns: Vec<Vec<f64>>,
    len: usize,
    armed: Option<usize>,
    current: Option<usize>,
}

impl UniformTimeSeries {
    /// A series shared by every unit.
    pub fn uniform(
        kind: VariableKind,
        start: NaiveDateTime,
        step: TimeDelta,
        values: Vec<f64>,
    ) -> Self {
        let len = values.len();
        Self {
            kind,
            start,
            step,
            columns: vec![values],
            len,
            armed: None,
            current: None,
        }
    }

    /// One column per unit; all columns must have the same length.
    pub fn distributed(
        kind: VariableKind,
        start: NaiveDateTime,
        step: TimeDelta,
        columns: Vec<Vec<f64>>,
    ) -> BuildResult<Self> {
        let len = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != len) {
            return Err(BuildError::InvalidArgument {
                what: format!("ragged columns in {kind} series"),
            });
        }
        Ok(Self {
            kind,
            start,
            step,
            columns,
            len,
            armed: None,
            current: None,
        })
    }

    /// Build from settings, sampled at the timer step.
    pub fn from_def(def: &ForcingSeriesDef, step: TimeDelta) -> BuildResult<Self> {
        let kind = VariableKind::from_name(&def.variable)?;
        let start = def.start.and_time(chrono::NaiveTime::MIN);
        match &def.values {
            SeriesValues::Uniform(values) => Ok(Self::uniform(kind, start, step, values.clone())),
            SeriesValues::Distributed(columns) => {
                Self::distributed(kind, start, step, columns.clone())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn index_of(&self, date: NaiveDateTime) -> Option<usize> {
        let offset = (date - self.start).num_seconds();
        let step = self.step.num_seconds();
        if offset < 0 || step <= 0 || offset % step != 0 {
            return None;
        }
        let index = (offset / step) as usize;
        (index < self.len).then_some(index)
    }
}

impl TimeSeries for UniformTimeSeries {
    fn variable_kind(&self) -> VariableKind {
        self.kind
    }

    fn set_cursor_to_date(&mut self, date: NaiveDateTime) -> bool {
        match self.index_of(date) {
            Some(index) => {
                self.armed = Some(index);
                self.current = None;
                true
            }
            None => false,
        }
    }

    fn advance_one_time_step(&mut self) -> bool {
        let next = match (self.current, self.armed) {
            (Some(i), _) => i + 1,
            (None, Some(i)) => i,
            (None, None) => 0,
        };
        if next >= self.len {
            return false;
        }
        self.current = Some(next);
        true
    }

    fn value(&self, unit_index: usize) -> Option<f64> {
        let column = if self.is_distributed() {
            self.columns.get(unit_index)?
        } else {
            self.columns.first()?
        };
        column.get(self.current?).copied()
    }

    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn end(&self) -> NaiveDateTime {
        let last = self.len.saturating_sub(1) as i32;
        self.start + self.step * last
    }

    fn is_distributed(&self) -> bool {
        self.columns.len() > 1
    }

    fn covers_unit(&self, unit_index: usize) -> bool {
        !self.is_distributed() || unit_index < self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series(values: Vec<f64>) -> UniformTimeSeries {
        UniformTimeSeries::uniform(VariableKind::Precipitation, day(1), TimeDelta::days(1), values)
    }

    #[test]
    fn cursor_is_armed_then_advanced() {
        let mut ts = series(vec![1.0, 2.0, 3.0]);
        assert!(ts.set_cursor_to_date(day(2)));
        assert_eq!(ts.value(0), None);
        assert!(ts.advance_one_time_step());
        assert_eq!(ts.value(0), Some(2.0));
        assert!(ts.advance_one_time_step());
        assert_eq!(ts.value(5), Some(3.0));
        assert!(!ts.advance_one_time_step());
        assert_eq!(ts.value(0), Some(3.0));
    }

    #[test]
    fn dates_outside_the_series_are_rejected() {
        let mut ts = series(vec![1.0, 2.0]);
        assert!(!ts.set_cursor_to_date(day(3)));
        assert!(!ts.set_cursor_to_date(NaiveDate::from_ymd_opt(2019, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap()));
        assert!(!ts.set_cursor_to_date(day(1) + TimeDelta::hours(3)));
        assert_eq!(ts.end(), day(2));
    }

    #[test]
    fn distributed_columns() {
        let mut ts = UniformTimeSeries::distributed(
            VariableKind::Precipitation,
            day(1),
            TimeDelta::days(1),
            vec![vec![1.0, 2.0], vec![10.0, 20.0]],
        )
        .unwrap();
        assert!(ts.is_distributed());
        assert!(ts.covers_unit(1));
        assert!(!ts.covers_unit(2));
        assert!(ts.advance_one_time_step());
        assert_eq!(ts.value(1), Some(10.0));
        assert_eq!(ts.value(2), None);

        assert!(UniformTimeSeries::distributed(
            VariableKind::Precipitation,
            day(1),
            TimeDelta::days(1),
            vec![vec![1.0, 2.0], vec![10.0]],
        )
        .is_err());
    }
}
