//! Simulation calendar.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use hf_core::same_tag;
use hf_project::TimerDef;

use crate::error::{BuildError, BuildResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Week,
    Day,
    Hour,
    Minute,
}

impl TimeUnit {
    pub fn from_name(name: &str) -> BuildResult<Self> {
        const TABLE: &[(&str, TimeUnit)] = &[
            ("week", TimeUnit::Week),
            ("day", TimeUnit::Day),
            ("days", TimeUnit::Day),
            ("hour", TimeUnit::Hour),
            ("hours", TimeUnit::Hour),
            ("minute", TimeUnit::Minute),
            ("minutes", TimeUnit::Minute),
        ];
        TABLE
            .iter()
            .find(|(alias, _)| same_tag(alias, name))
            .map(|(_, unit)| *unit)
            .ok_or_else(|| BuildError::InvalidArgument {
                what: format!("unknown time step unit '{name}'"),
            })
    }

    fn duration(self, count: i64) -> TimeDelta {
        match self {
            TimeUnit::Week => TimeDelta::weeks(count),
            TimeUnit::Day => TimeDelta::days(count),
            TimeUnit::Hour => TimeDelta::hours(count),
            TimeUnit::Minute => TimeDelta::minutes(count),
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// Fixed-step calendar between two inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    start: NaiveDateTime,
    end: NaiveDateTime,
    step: TimeDelta,
    current: NaiveDateTime,
    index: usize,
}

impl Timer {
    pub fn new(def: &TimerDef) -> BuildResult<Self> {
        let unit = TimeUnit::from_name(&def.time_step_unit)?;
        if def.time_step == 0 {
            return Err(BuildError::InvalidArgument {
                what: "time step must be positive".to_string(),
            });
        }
        if def.end < def.start {
            return Err(BuildError::InvalidArgument {
                what: format!("timer ends ({}) before it starts ({})", def.end, def.start),
            });
        }
        let start = midnight(def.start);
        Ok(Self {
            start,
            end: midnight(def.end),
            step: unit.duration(i64::from(def.time_step)),
            current: start,
            index: 0,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn time_step(&self) -> TimeDelta {
        self.step
    }

    /// Length of a step in days: rates are expressed per day.
    pub fn time_step_in_days(&self) -> f64 {
        self.step.num_seconds() as f64 / 86_400.0
    }

    /// Number of steps from start to end, both included.
    pub fn time_steps_count(&self) -> usize {
        let span = (self.end - self.start).num_seconds();
        let step = self.step.num_seconds();
        (span / step) as usize + 1
    }

    pub fn date(&self) -> NaiveDateTime {
        self.current
    }

    /// 0-based index of the current step.
    pub fn step_index(&self) -> usize {
        self.index
    }

    pub fn is_over(&self) -> bool {
        self.current > self.end
    }

    pub fn increment_time(&mut self) {
        self.current += self.step;
        self.index += 1;
    }

    pub fn reset(&mut self) {
        self.current = self.start;
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(start: (i32, u32, u32), end: (i32, u32, u32), step: u32, unit: &str) -> TimerDef {
        TimerDef {
            start: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            time_step: step,
            time_step_unit: unit.to_string(),
        }
    }

    #[test]
    fn daily_count_is_inclusive() {
        let timer = Timer::new(&def((2020, 1, 1), (2020, 1, 10), 1, "Day")).unwrap();
        assert_eq!(timer.time_steps_count(), 10);
        assert_eq!(timer.time_step_in_days(), 1.0);
    }

    #[test]
    fn hourly_steps() {
        let timer = Timer::new(&def((2020, 1, 1), (2020, 1, 2), 6, "hour")).unwrap();
        assert_eq!(timer.time_steps_count(), 5);
        assert_eq!(timer.time_step_in_days(), 0.25);
    }

    #[test]
    fn loop_visits_every_step() {
        let mut timer = Timer::new(&def((2020, 2, 27), (2020, 3, 1), 1, "Day")).unwrap();
        let mut visited = 0;
        while !timer.is_over() {
            visited += 1;
            timer.increment_time();
        }
        assert_eq!(visited, 4);
        assert_eq!(timer.step_index(), 4);
        timer.reset();
        assert_eq!(timer.date(), timer.start());
    }

    #[test]
    fn unknown_unit() {
        assert!(matches!(
            Timer::new(&def((2020, 1, 1), (2020, 1, 2), 1, "fortnight")),
            Err(BuildError::InvalidArgument { .. })
        ));
    }
}
