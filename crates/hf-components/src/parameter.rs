//! Parameters and time-indexed parameter providers.
//!
//! A parameter is never a shared mutable cell: processes own their
//! [`ParameterValue`] and evaluate it against the [`EvalContext`] handed to
//! them on every rate evaluation.

use chrono::{Datelike, NaiveDate};
use hf_core::same_tag;

use crate::error::{ComponentError, ComponentResult};

/// Evaluation context passed by reference to every rate computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    pub date: NaiveDate,
}

impl EvalContext {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }
}

/// A scalar or time-varying parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Constant(f64),
    /// One value per calendar month, January first.
    Monthly([f64; 12]),
    /// One value per year starting at `first_year`; held constant outside the range.
    Yearly { first_year: i32, values: Vec<f64> },
    /// Step function: the value of the latest date not after the evaluation date.
    Dates { dates: Vec<NaiveDate>, values: Vec<f64> },
}

impl ParameterValue {
    /// Build a yearly provider covering `first_year..=last_year`.
    ///
    /// Fails when the number of values does not match the year range.
    pub fn yearly(first_year: i32, last_year: i32, values: Vec<f64>) -> ComponentResult<Self> {
        let expected = i64::from(last_year) - i64::from(first_year) + 1;
        if expected <= 0 || values.len() as i64 != expected {
            return Err(ComponentError::InvalidArg {
                what: format!(
                    "yearly parameter for {first_year}..={last_year} needs {expected} values, got {}",
                    values.len()
                ),
            });
        }
        Ok(ParameterValue::Yearly { first_year, values })
    }

    /// Build a date-indexed provider. Dates must be strictly increasing.
    pub fn dates(dates: Vec<NaiveDate>, values: Vec<f64>) -> ComponentResult<Self> {
        if dates.is_empty() || dates.len() != values.len() {
            return Err(ComponentError::InvalidArg {
                what: "date parameter needs one value per date".to_string(),
            });
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ComponentError::InvalidArg {
                what: "parameter dates must be strictly increasing".to_string(),
            });
        }
        Ok(ParameterValue::Dates { dates, values })
    }

    /// Value in effect for the context's date. NaN for an empty provider.
    pub fn value_at(&self, ctx: &EvalContext) -> f64 {
        match self {
            ParameterValue::Constant(v) => *v,
            ParameterValue::Monthly(values) => values[ctx.date.month0() as usize],
            ParameterValue::Yearly { first_year, values } => {
                let offset = (ctx.date.year() - first_year).max(0) as usize;
                let last = values.len().saturating_sub(1);
                values.get(offset.min(last)).copied().unwrap_or(f64::NAN)
            }
            ParameterValue::Dates { dates, values } => {
                let idx = dates.partition_point(|d| *d <= ctx.date);
                values.get(idx.saturating_sub(1)).copied().unwrap_or(f64::NAN)
            }
        }
    }

    /// Every value the provider can ever return.
    pub fn values(&self) -> &[f64] {
        match self {
            ParameterValue::Constant(v) => std::slice::from_ref(v),
            ParameterValue::Monthly(values) => values,
            ParameterValue::Yearly { values, .. } | ParameterValue::Dates { values, .. } => values,
        }
    }
}

/// A named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
}

impl Parameter {
    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: ParameterValue::Constant(value),
        }
    }
}

/// Ordered parameter mapping owned by a brick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter (names compare case-insensitively).
    pub fn insert(&mut self, parameter: Parameter) {
        match self.params.iter_mut().find(|p| same_tag(&p.name, &parameter.name)) {
            Some(existing) => *existing = parameter,
            None => self.params.push(parameter),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.params
            .iter()
            .find(|p| same_tag(&p.name, name))
            .map(|p| &p.value)
    }

    /// Fetch a parameter that must be present.
    pub fn require(&self, owner: &str, name: &str) -> ComponentResult<&ParameterValue> {
        self.get(name).ok_or_else(|| ComponentError::MissingParameter {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        let mut set = ParameterSet::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}
