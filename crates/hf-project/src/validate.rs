//! Project validation logic.
//!
//! Structural checks only: tag values (brick type, flux type, solver name)
//! are resolved and reported when the model is built.

use crate::schema::{
    ForcingSeriesDef, HydroUnitDef, ModelStructureDef, OutputDef, Project, SeriesValues, TimerDef,
};
use std::collections::HashSet;

/// Schema version written by this crate.
pub const CURRENT_VERSION: u32 = 1;

/// Reserved output target naming the basin outlet.
pub const OUTLET_TARGET: &str = "outlet";

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > CURRENT_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    if project.structures.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "structures".to_string(),
            value: "[]".to_string(),
            reason: "at least one model structure is required".to_string(),
        });
    }

    let mut structure_ids = HashSet::new();
    for structure in &project.structures {
        if !structure_ids.insert(structure.id) {
            return Err(ValidationError::DuplicateId {
                id: structure.id.to_string(),
                context: "structures".to_string(),
            });
        }
        validate_structure(structure)?;
    }

    if project.solver.iterations == 0 {
        return Err(ValidationError::InvalidValue {
            field: "solver.iterations".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    validate_timer(&project.timer)?;
    validate_units(&project.hydro_units)?;

    let mut variables = HashSet::new();
    for series in &project.forcing {
        if !variables.insert(series.variable.to_ascii_lowercase()) {
            return Err(ValidationError::DuplicateId {
                id: series.variable.clone(),
                context: "forcing".to_string(),
            });
        }
        validate_series(series, project.hydro_units.len())?;
    }

    Ok(())
}

fn validate_structure(structure: &ModelStructureDef) -> Result<(), ValidationError> {
    let context = format!("structure {}", structure.id);
    let mut names = HashSet::new();
    for name in structure
        .bricks
        .iter()
        .map(|b| &b.name)
        .chain(structure.splitters.iter().map(|s| &s.name))
    {
        if name.eq_ignore_ascii_case(OUTLET_TARGET) {
            return Err(ValidationError::InvalidValue {
                field: format!("{context} name"),
                value: name.clone(),
                reason: "reserved for the basin outlet".to_string(),
            });
        }
        if !names.insert(name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: name.clone(),
                context: context.clone(),
            });
        }
    }

    let check_target = |owner: &str, output: &OutputDef| {
        if output.target.eq_ignore_ascii_case(OUTLET_TARGET) || names.contains(output.target.as_str())
        {
            Ok(())
        } else {
            Err(ValidationError::MissingReference {
                id: output.target.clone(),
                context: format!("{context} output of '{owner}'"),
            })
        }
    };

    for brick in &structure.bricks {
        for output in &brick.outputs {
            check_target(&brick.name, output)?;
        }
        for parameter in &brick.parameters {
            if parameter.kind.eq_ignore_ascii_case("constant") && parameter.value.is_none() {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}.{}", brick.name, parameter.name),
                    value: "none".to_string(),
                    reason: "constant parameter needs a value".to_string(),
                });
            }
        }
    }

    for splitter in &structure.splitters {
        for output in &splitter.outputs {
            check_target(&splitter.name, output)?;
        }
        if splitter.fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.fractions", splitter.name),
                value: format!("{:?}", splitter.fractions),
                reason: "fractions must be finite and non-negative".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_timer(timer: &TimerDef) -> Result<(), ValidationError> {
    if timer.end < timer.start {
        return Err(ValidationError::InvalidValue {
            field: "timer.end".to_string(),
            value: timer.end.to_string(),
            reason: format!("before start {}", timer.start),
        });
    }
    if timer.time_step == 0 {
        return Err(ValidationError::InvalidValue {
            field: "timer.time_step".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_units(units: &[HydroUnitDef]) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for unit in units {
        if !ids.insert(unit.id) {
            return Err(ValidationError::DuplicateId {
                id: unit.id.to_string(),
                context: "hydro_units".to_string(),
            });
        }
        if !(unit.area.is_finite() && unit.area > 0.0) {
            return Err(ValidationError::InvalidValue {
                field: format!("hydro_units[{}].area", unit.id),
                value: unit.area.to_string(),
                reason: "must be positive".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_series(series: &ForcingSeriesDef, unit_count: usize) -> Result<(), ValidationError> {
    if series.values.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("forcing.{}", series.variable),
            value: "[]".to_string(),
            reason: "no data".to_string(),
        });
    }
    if let SeriesValues::Distributed(columns) = &series.values {
        if columns.len() != unit_count {
            return Err(ValidationError::InvalidValue {
                field: format!("forcing.{}", series.variable),
                value: columns.len().to_string(),
                reason: format!("expected one column per unit ({unit_count})"),
            });
        }
        let len = series.values.len();
        if columns.iter().any(|c| c.len() != len) {
            return Err(ValidationError::InvalidValue {
                field: format!("forcing.{}", series.variable),
                value: "ragged".to_string(),
                reason: "all columns must have the same length".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BrickDef, SolverDef};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn brick(name: &str, target: &str) -> BrickDef {
        BrickDef {
            name: name.to_string(),
            kind: "Storage".to_string(),
            process: None,
            parameters: vec![],
            forcing: vec![],
            outputs: vec![OutputDef::direct(target)],
            log: vec![],
        }
    }

    fn project(bricks: Vec<BrickDef>) -> Project {
        Project {
            version: CURRENT_VERSION,
            name: "test".to_string(),
            structures: vec![ModelStructureDef {
                id: 1,
                bricks,
                splitters: vec![],
                log_items: vec![],
            }],
            solver: SolverDef::default(),
            timer: TimerDef::daily(date(2020, 1, 1), date(2020, 1, 31)),
            hydro_units: vec![HydroUnitDef { id: 1, area: 10.0 }],
            forcing: vec![],
        }
    }

    #[test]
    fn chain_is_valid() {
        let p = project(vec![brick("a", "b"), brick("b", "Outlet")]);
        assert!(validate_project(&p).is_ok());
    }

    #[test]
    fn unknown_target() {
        let p = project(vec![brick("a", "nowhere")]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn duplicate_brick() {
        let p = project(vec![brick("a", "outlet"), brick("a", "outlet")]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn reversed_timer() {
        let mut p = project(vec![brick("a", "outlet")]);
        p.timer = TimerDef::daily(date(2020, 2, 1), date(2020, 1, 1));
        assert!(validate_project(&p).is_err());
    }

    #[test]
    fn ragged_distributed_forcing() {
        let mut p = project(vec![brick("a", "outlet")]);
        p.hydro_units.push(HydroUnitDef { id: 2, area: 5.0 });
        p.forcing.push(ForcingSeriesDef {
            variable: "Precipitation".to_string(),
            start: date(2020, 1, 1),
            values: SeriesValues::Distributed(vec![vec![1.0, 2.0], vec![1.0]]),
        });
        assert!(validate_project(&p).is_err());
    }

    #[test]
    fn future_version_is_rejected() {
        let mut p = project(vec![brick("a", "outlet")]);
        p.version = CURRENT_VERSION + 1;
        assert_eq!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion {
                version: CURRENT_VERSION + 1
            })
        );
    }
}
