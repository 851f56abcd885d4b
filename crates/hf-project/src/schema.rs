//! Project schema definitions.
//!
//! Type tags (brick type, flux type, solver name, parameter kind) are kept as
//! strings: they are resolved, case-insensitively, when the model is built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub structures: Vec<ModelStructureDef>,
    #[serde(default)]
    pub solver: SolverDef,
    pub timer: TimerDef,
    #[serde(default)]
    pub hydro_units: Vec<HydroUnitDef>,
    #[serde(default)]
    pub forcing: Vec<ForcingSeriesDef>,
}

/// One alternative model structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelStructureDef {
    pub id: u32,
    #[serde(default)]
    pub bricks: Vec<BrickDef>,
    #[serde(default)]
    pub splitters: Vec<SplitterDef>,
    /// Basin-level (aggregated) log labels, e.g. `outlet`.
    #[serde(default)]
    pub log_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrickDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Outflow process tag; `outflow:linear` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    /// Forcing variables feeding the brick (e.g. `Precipitation`).
    #[serde(default)]
    pub forcing: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<OutputDef>,
    /// Per-unit values to log (`content`, `output`, `output-2`, ...).
    #[serde(default)]
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterDef {
    pub name: String,
    #[serde(default = "default_parameter_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<NaiveDate>,
}

fn default_parameter_kind() -> String {
    "Constant".to_string()
}

impl ParameterDef {
    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            kind: default_parameter_kind(),
            value: Some(value),
            values: Vec::new(),
            first_year: None,
            last_year: None,
            dates: Vec::new(),
        }
    }
}

/// Output flux of a brick or splitter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDef {
    /// `outlet`, or the name of a brick or splitter of the same structure.
    pub target: String,
    #[serde(rename = "type", default = "default_output_kind")]
    pub kind: String,
}

fn default_output_kind() -> String {
    "Direct".to_string()
}

impl OutputDef {
    pub fn direct(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: default_output_kind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplitterDef {
    pub name: String,
    #[serde(rename = "type", default = "default_splitter_kind")]
    pub kind: String,
    /// `broadcast` (default) or `proportional`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fractions: Vec<f64>,
    #[serde(default)]
    pub outputs: Vec<OutputDef>,
}

fn default_splitter_kind() -> String {
    "MultiFluxes".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default = "default_solver_name")]
    pub name: String,
    /// Sub-steps per external time step.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_solver_name() -> String {
    "RK4".to_string()
}

fn default_iterations() -> u32 {
    1
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            name: default_solver_name(),
            iterations: default_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerDef {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "default_time_step")]
    pub time_step: u32,
    #[serde(default = "default_time_step_unit")]
    pub time_step_unit: String,
}

fn default_time_step() -> u32 {
    1
}

fn default_time_step_unit() -> String {
    "Day".to_string()
}

impl TimerDef {
    pub fn daily(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            time_step: default_time_step(),
            time_step_unit: default_time_step_unit(),
        }
    }
}

/// A spatial unit (sub-catchment). Delineation happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HydroUnitDef {
    pub id: u32,
    #[serde(default = "default_area")]
    pub area: f64,
}

fn default_area() -> f64 {
    1.0
}

/// Forcing data for one variable, sampled at the timer's step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForcingSeriesDef {
    pub variable: String,
    pub start: NaiveDate,
    pub values: SeriesValues,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SeriesValues {
    /// One column shared by every unit.
    Uniform(Vec<f64>),
    /// One column per unit, in unit declaration order.
    Distributed(Vec<Vec<f64>>),
}

impl SeriesValues {
    /// Number of time steps held.
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Uniform(v) => v.len(),
            SeriesValues::Distributed(cols) => cols.first().map_or(0, Vec::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
