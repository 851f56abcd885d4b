//! Programmatic construction of model settings.
//!
//! `SettingsModel` keeps a cursor on the selected structure and on the last
//! added brick; the `*_to_current_brick` calls apply to that brick.

use chrono::NaiveDate;

use crate::schema::{
    BrickDef, ForcingSeriesDef, HydroUnitDef, ModelStructureDef, OutputDef, ParameterDef, Project,
    SolverDef, SplitterDef, TimerDef,
};
use crate::validate::CURRENT_VERSION;
use crate::{ProjectError, ProjectResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsModel {
    structures: Vec<ModelStructureDef>,
    selected: usize,
    current_brick: Option<usize>,
    solver: SolverDef,
    timer: Option<TimerDef>,
}

impl Default for SettingsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsModel {
    /// Start with a single empty structure (id 1) selected.
    pub fn new() -> Self {
        Self {
            structures: vec![ModelStructureDef {
                id: 1,
                bricks: Vec::new(),
                splitters: Vec::new(),
                log_items: Vec::new(),
            }],
            selected: 0,
            current_brick: None,
            solver: SolverDef::default(),
            timer: None,
        }
    }

    pub fn set_solver(&mut self, name: &str) {
        self.solver.name = name.to_string();
    }

    pub fn set_solver_iterations(&mut self, iterations: u32) {
        self.solver.iterations = iterations;
    }

    pub fn set_timer(&mut self, start: NaiveDate, end: NaiveDate, time_step: u32, unit: &str) {
        self.timer = Some(TimerDef {
            start,
            end,
            time_step,
            time_step_unit: unit.to_string(),
        });
    }

    /// Register a new, empty alternative structure and select it.
    pub fn add_structure(&mut self, id: u32) -> ProjectResult<()> {
        if self.structures.iter().any(|s| s.id == id) {
            return Err(ProjectError::InvalidArgument {
                what: format!("structure {id} already exists"),
            });
        }
        self.structures.push(ModelStructureDef {
            id,
            bricks: Vec::new(),
            splitters: Vec::new(),
            log_items: Vec::new(),
        });
        self.selected = self.structures.len() - 1;
        self.current_brick = None;
        Ok(())
    }

    /// Select a structure by id. The first brick (if any) becomes current.
    pub fn select_structure(&mut self, id: u32) -> bool {
        match self.structures.iter().position(|s| s.id == id) {
            Some(i) => {
                self.selected = i;
                self.current_brick = if self.structures[i].bricks.is_empty() {
                    None
                } else {
                    Some(0)
                };
                true
            }
            None => false,
        }
    }

    pub fn add_brick(&mut self, name: &str, kind: &str) {
        let structure = self.selected_mut();
        structure.bricks.push(BrickDef {
            name: name.to_string(),
            kind: kind.to_string(),
            process: None,
            parameters: Vec::new(),
            forcing: Vec::new(),
            outputs: Vec::new(),
            log: Vec::new(),
        });
        let index = structure.bricks.len() - 1;
        self.current_brick = Some(index);
    }

    pub fn set_process_to_current_brick(&mut self, tag: &str) -> ProjectResult<()> {
        self.current_brick_mut()?.process = Some(tag.to_string());
        Ok(())
    }

    /// Only constant parameters can be declared this way.
    pub fn add_parameter_to_current_brick(
        &mut self,
        name: &str,
        value: f64,
        kind: &str,
    ) -> ProjectResult<()> {
        if !kind.trim().eq_ignore_ascii_case("constant") {
            return Err(ProjectError::NotImplemented {
                what: format!("parameter kind '{kind}'"),
            });
        }
        self.current_brick_mut()?
            .parameters
            .push(ParameterDef::constant(name, value));
        Ok(())
    }

    pub fn add_forcing_to_current_brick(&mut self, name: &str) -> ProjectResult<()> {
        if !name.trim().eq_ignore_ascii_case("precipitation") {
            return Err(ProjectError::InvalidArgument {
                what: format!("forcing '{name}' is not supported"),
            });
        }
        self.current_brick_mut()?
            .forcing
            .push("Precipitation".to_string());
        Ok(())
    }

    pub fn add_output_to_current_brick(&mut self, target: &str, kind: &str) -> ProjectResult<()> {
        self.current_brick_mut()?.outputs.push(OutputDef {
            target: target.to_string(),
            kind: kind.to_string(),
        });
        Ok(())
    }

    pub fn add_logging_to_current_brick(&mut self, item: &str) -> ProjectResult<()> {
        self.current_brick_mut()?.log.push(item.to_string());
        Ok(())
    }

    /// Log a basin-level item (e.g. `outlet`).
    pub fn add_logging_to_item(&mut self, item: &str) {
        self.selected_mut().log_items.push(item.to_string());
    }

    pub fn add_splitter(&mut self, splitter: SplitterDef) {
        self.selected_mut().splitters.push(splitter);
    }

    pub fn structures(&self) -> &[ModelStructureDef] {
        &self.structures
    }

    pub fn selected_structure(&self) -> &ModelStructureDef {
        &self.structures[self.selected]
    }

    /// Per-unit log labels of the selected structure, `<brick>:<item>`.
    pub fn hydro_unit_log_labels(&self) -> Vec<String> {
        self.selected_structure()
            .bricks
            .iter()
            .flat_map(|b| b.log.iter().map(move |item| format!("{}:{}", b.name, item)))
            .collect()
    }

    pub fn aggregated_log_labels(&self) -> &[String] {
        &self.selected_structure().log_items
    }

    /// Assemble a project. Fails when no timer was set.
    pub fn into_project(
        self,
        name: &str,
        hydro_units: Vec<HydroUnitDef>,
        forcing: Vec<ForcingSeriesDef>,
    ) -> ProjectResult<Project> {
        let timer = self.timer.ok_or_else(|| ProjectError::InvalidArgument {
            what: "timer not set".to_string(),
        })?;
        Ok(Project {
            version: CURRENT_VERSION,
            name: name.to_string(),
            structures: self.structures,
            solver: self.solver,
            timer,
            hydro_units,
            forcing,
        })
    }

    fn selected_mut(&mut self) -> &mut ModelStructureDef {
        &mut self.structures[self.selected]
    }

    fn current_brick_mut(&mut self) -> ProjectResult<&mut BrickDef> {
        let index = self.current_brick.ok_or(ProjectError::NoCurrentBrick)?;
        self.structures[self.selected]
            .bricks
            .get_mut(index)
            .ok_or(ProjectError::NoCurrentBrick)
    }
}
