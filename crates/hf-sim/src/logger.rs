//! Output logger.
//!
//! Values are registered once, as [`ValueRef`]s, after the structure is
//! assembled. Every `record` reads them from the structure into dense
//! matrices (one row per time step).

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use hf_components::ValueRef;
use nalgebra::DMatrix;
use serde::Serialize;

use crate::error::{BuildError, BuildResult};
use crate::structure::ModelStructure;

#[derive(Debug, Clone)]
pub struct Logger {
    aggregated_labels: Vec<String>,
    unit_labels: Vec<String>,
    unit_count: usize,
    step_count: usize,
    dates: Vec<NaiveDateTime>,
    /// steps × aggregated labels
    aggregated: DMatrix<f64>,
    /// One steps × units matrix per unit label.
    unit_values: Vec<DMatrix<f64>>,
    aggregated_refs: Vec<Option<ValueRef>>,
    /// [label][unit]
    unit_refs: Vec<Vec<Option<ValueRef>>>,
    cursor: usize,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialisable copy of everything recorded so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSummary {
    pub dates: Vec<NaiveDateTime>,
    pub aggregated: BTreeMap<String, Vec<f64>>,
    /// label -> one series per unit
    pub units: BTreeMap<String, Vec<Vec<f64>>>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            aggregated_labels: Vec::new(),
            unit_labels: Vec::new(),
            unit_count: 0,
            step_count: 0,
            dates: Vec::new(),
            aggregated: DMatrix::zeros(0, 0),
            unit_values: Vec::new(),
            aggregated_refs: Vec::new(),
            unit_refs: Vec::new(),
            cursor: 0,
        }
    }

    pub fn init_container(
        &mut self,
        step_count: usize,
        unit_count: usize,
        aggregated_labels: Vec<String>,
        unit_labels: Vec<String>,
    ) {
        self.step_count = step_count;
        self.unit_count = unit_count;
        self.dates = Vec::with_capacity(step_count);
        self.aggregated = DMatrix::from_element(step_count, aggregated_labels.len(), f64::NAN);
        self.unit_values = unit_labels
            .iter()
            .map(|_| DMatrix::from_element(step_count, unit_count, f64::NAN))
            .collect();
        self.aggregated_refs = vec![None; aggregated_labels.len()];
        self.unit_refs = vec![vec![None; unit_count]; unit_labels.len()];
        self.aggregated_labels = aggregated_labels;
        self.unit_labels = unit_labels;
        self.cursor = 0;
    }

    pub fn set_aggregated_value_ref(&mut self, index: usize, value: ValueRef) -> BuildResult<()> {
        let slot = self
            .aggregated_refs
            .get_mut(index)
            .ok_or_else(|| BuildError::ShouldNotHappen {
                what: format!("aggregated log index {index} out of range"),
            })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn set_hydro_unit_value_ref(
        &mut self,
        unit_index: usize,
        label_index: usize,
        value: ValueRef,
    ) -> BuildResult<()> {
        let slot = self
            .unit_refs
            .get_mut(label_index)
            .and_then(|units| units.get_mut(unit_index))
            .ok_or_else(|| BuildError::ShouldNotHappen {
                what: format!("unit log slot ({unit_index}, {label_index}) out of range"),
            })?;
        *slot = Some(value);
        Ok(())
    }

    /// Whether every label of every unit has a registered value.
    pub fn is_fully_connected(&self) -> bool {
        self.aggregated_refs.iter().all(Option::is_some)
            && self.unit_refs.iter().flatten().all(Option::is_some)
    }

    pub fn set_date_time(&mut self, date: NaiveDateTime) {
        if self.cursor < self.step_count {
            self.dates.truncate(self.cursor);
            self.dates.push(date);
        }
    }

    /// Copy every registered value into the current row.
    pub fn record(&mut self, structure: &ModelStructure) {
        let row = self.cursor;
        if row >= self.step_count {
            return;
        }
        for (col, value) in self.aggregated_refs.iter().enumerate() {
            self.aggregated[(row, col)] = value
                .and_then(|v| structure.value(v))
                .unwrap_or(f64::NAN);
        }
        for (label, units) in self.unit_refs.iter().enumerate() {
            for (unit, value) in units.iter().enumerate() {
                self.unit_values[label][(row, unit)] = value
                    .and_then(|v| structure.value(v))
                    .unwrap_or(f64::NAN);
            }
        }
    }

    pub fn increment(&mut self) {
        self.cursor += 1;
    }

    pub fn recorded_steps(&self) -> usize {
        self.cursor.min(self.step_count)
    }

    pub fn unit_count(&self) -> usize {
        self.unit_count
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn dates(&self) -> &[NaiveDateTime] {
        &self.dates[..self.recorded_steps().min(self.dates.len())]
    }

    pub fn aggregated_labels(&self) -> &[String] {
        &self.aggregated_labels
    }

    pub fn unit_labels(&self) -> &[String] {
        &self.unit_labels
    }

    /// Recorded series of a basin-level label.
    pub fn aggregated_values(&self, label: &str) -> Option<Vec<f64>> {
        let col = self.aggregated_labels.iter().position(|l| l == label)?;
        Some(
            self.aggregated
                .column(col)
                .iter()
                .take(self.recorded_steps())
                .copied()
                .collect(),
        )
    }

    /// Recorded steps × units values of a unit label.
    pub fn unit_values(&self, label: &str) -> Option<DMatrix<f64>> {
        let index = self.unit_labels.iter().position(|l| l == label)?;
        let values = &self.unit_values[index];
        Some(values.rows(0, self.recorded_steps()).into_owned())
    }

    pub fn summary(&self) -> LogSummary {
        let aggregated = self
            .aggregated_labels
            .iter()
            .filter_map(|l| Some((l.clone(), self.aggregated_values(l)?)))
            .collect();
        let units = self
            .unit_labels
            .iter()
            .filter_map(|l| {
                let m = self.unit_values(l)?;
                let series = (0..m.ncols())
                    .map(|u| m.column(u).iter().copied().collect())
                    .collect();
                Some((l.clone(), series))
            })
            .collect();
        LogSummary {
            dates: self.dates().to_vec(),
            aggregated,
            units,
        }
    }
}
