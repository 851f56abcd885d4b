//! Model driver: initialization and the time loop.

use hf_components::EvalContext;
use hf_project::{HydroUnitDef, Project};
use tracing::{debug, error, info, warn};

use crate::builder::build_model_structure;
use crate::error::{BuildError, SimError, SimResult, StepError};
use crate::logger::Logger;
use crate::processor::Processor;
use crate::structure::ModelStructure;
use crate::timer::Timer;
use crate::timeseries::TimeSeries;

/// Lifecycle of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Uninitialized,
    Ready,
    Running,
    Completed,
    Failed,
}

/// Link between a forcing of the structure and the series feeding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ForcingBinding {
    unit: usize,
    series: usize,
}

/// Everything that exists once the model is initialized.
struct Assembled {
    structure: ModelStructure,
    processor: Processor,
    timer: Timer,
}

pub struct ModelHydro {
    state: ModelState,
    assembled: Option<Assembled>,
    logger: Logger,
    time_series: Vec<Box<dyn TimeSeries>>,
    bindings: Vec<ForcingBinding>,
}

impl Default for ModelHydro {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelHydro {
    pub fn new() -> Self {
        Self {
            state: ModelState::Uninitialized,
            assembled: None,
            logger: Logger::new(),
            time_series: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn structure(&self) -> Option<&ModelStructure> {
        self.assembled.as_ref().map(|a| &a.structure)
    }

    pub fn processor(&self) -> Option<&Processor> {
        self.assembled.as_ref().map(|a| &a.processor)
    }

    pub fn timer(&self) -> Option<&Timer> {
        self.assembled.as_ref().map(|a| &a.timer)
    }

    /// Build the structure, configure the timer and the processor, and
    /// register every logged value.
    pub fn initialize(&mut self, project: &Project, units: &[HydroUnitDef]) -> SimResult<()> {
        match self.assemble(project, units) {
            Ok(assembled) => {
                self.assembled = Some(assembled);
                self.state = ModelState::Ready;
                info!(project = %project.name, "model ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "model initialization failed");
                self.assembled = None;
                self.state = ModelState::Uninitialized;
                Err(e.into())
            }
        }
    }

    fn assemble(&mut self, project: &Project, units: &[HydroUnitDef]) -> Result<Assembled, BuildError> {
        let def = project
            .structures
            .first()
            .ok_or_else(|| BuildError::InvalidArgument {
                what: "project has no model structure".to_string(),
            })?;
        let structure = build_model_structure(project, def.id, units)?;
        let timer = Timer::new(&project.timer)?;
        let mut processor = Processor::new(&project.solver)?;
        processor.initialize(&structure);

        let unit_labels: Vec<String> = def
            .bricks
            .iter()
            .flat_map(|b| b.log.iter().map(move |item| format!("{}:{}", b.name, item)))
            .collect();
        self.logger.init_container(
            timer.time_steps_count(),
            units.len(),
            def.log_items.clone(),
            unit_labels,
        );

        for (i, label) in def.log_items.iter().enumerate() {
            let value = structure.aggregated_value_ref(label).ok_or_else(|| {
                BuildError::ShouldNotHappen {
                    what: format!("aggregated log item '{label}' has no value"),
                }
            })?;
            self.logger.set_aggregated_value_ref(i, value)?;
        }

        let mut label = 0;
        for brick in &def.bricks {
            for item in &brick.log {
                for unit in 0..units.len() {
                    let value = structure
                        .unit_brick(unit, &brick.name)
                        .and_then(|b| b.value_ref(item).ok())
                        .ok_or_else(|| BuildError::ShouldNotHappen {
                            what: format!("log item '{item}' of brick '{}' has no value", brick.name),
                        })?;
                    self.logger.set_hydro_unit_value_ref(unit, label, value)?;
                }
                label += 1;
            }
        }
        debug!(labels = label, "logger connected");

        Ok(Assembled {
            structure,
            processor,
            timer,
        })
    }

    /// Register a forcing series. Only one series per variable is accepted.
    pub fn add_time_series(&mut self, series: Box<dyn TimeSeries>) -> bool {
        let kind = series.variable_kind();
        if self.time_series.iter().any(|ts| ts.variable_kind() == kind) {
            error!(variable = %kind, "a series for this variable is already attached");
            return false;
        }
        self.time_series.push(series);
        true
    }

    /// Bind every forcing of every unit to the series of its variable.
    pub fn attach_time_series_to_hydro_units(&mut self) -> bool {
        let Some(assembled) = &self.assembled else {
            error!("time series attached before initialization");
            return false;
        };
        let structure = &assembled.structure;

        let mut bindings = Vec::with_capacity(structure.forcings().len());
        for (unit_index, unit) in structure.units().iter().enumerate() {
            for &f in unit.forcing_indices() {
                let kind = structure.forcings()[f].kind();
                let Some(series) = self
                    .time_series
                    .iter()
                    .position(|ts| ts.variable_kind() == kind)
                else {
                    error!(unit = unit.settings_id, variable = %kind, "no series for forcing");
                    return false;
                };
                if !self.time_series[series].covers_unit(unit_index) {
                    error!(unit = unit.settings_id, variable = %kind, "series has no data for unit");
                    return false;
                }
                bindings.push(ForcingBinding {
                    unit: unit_index,
                    series,
                });
            }
        }
        self.bindings = bindings;
        true
    }

    pub fn is_ok(&self) -> bool {
        self.assembled
            .as_ref()
            .is_some_and(|a| a.structure.is_ok())
    }

    /// Run the time loop to the end of the timer.
    ///
    /// On failure the model is left `Failed`; steps recorded before the
    /// failing one stay available in the logger.
    pub fn run(&mut self) -> SimResult<()> {
        if self.state != ModelState::Ready {
            return Err(SimError::InvalidState {
                what: "run requires an initialized model that has not run yet",
            });
        }
        self.state = ModelState::Running;
        match self.time_loop() {
            Ok(()) => {
                self.state = ModelState::Completed;
                info!(steps = self.logger.recorded_steps(), "run completed");
                Ok(())
            }
            Err(e) => {
                self.state = ModelState::Failed;
                error!(error = %e, "run failed");
                Err(e)
            }
        }
    }

    fn time_loop(&mut self) -> SimResult<()> {
        let Some(assembled) = self.assembled.as_mut() else {
            return Err(SimError::InvalidState {
                what: "model is not initialized",
            });
        };
        let expected: usize = assembled
            .structure
            .units()
            .iter()
            .map(|u| u.forcing_indices().len())
            .sum();
        if self.bindings.len() != expected {
            return Err(SimError::Step {
                step: 0,
                source: StepError::InvalidConfiguration {
                    what: "forcings are not attached to time series".to_string(),
                },
            });
        }

        let start = assembled.timer.date();
        for ts in &mut self.time_series {
            if !ts.set_cursor_to_date(start) {
                return Err(SimError::Step {
                    step: 0,
                    source: StepError::InvalidConfiguration {
                        what: format!("{} series does not cover {start}", ts.variable_kind()),
                    },
                });
            }
        }

        let dt = assembled.timer.time_step_in_days();
        while !assembled.timer.is_over() {
            let step = assembled.timer.step_index();
            let date = assembled.timer.date();

            for ts in &mut self.time_series {
                if !ts.advance_one_time_step() {
                    warn!(step, variable = %ts.variable_kind(), "forcing data exhausted");
                    return Err(SimError::Step {
                        step,
                        source: StepError::ForcingExhausted {
                            variable: ts.variable_kind().to_string(),
                        },
                    });
                }
            }
            update_forcing(&mut assembled.structure, &self.time_series, &self.bindings, step)?;

            assembled
                .processor
                .process_time_step(&mut assembled.structure, EvalContext::new(date.date()), dt)
                .map_err(|source| SimError::Step { step, source })?;

            self.logger.set_date_time(date);
            self.logger.record(&assembled.structure);
            assembled.timer.increment_time();
            self.logger.increment();
        }
        Ok(())
    }
}

/// Copy the current series values into the bound forcings.
fn update_forcing(
    structure: &mut ModelStructure,
    time_series: &[Box<dyn TimeSeries>],
    bindings: &[ForcingBinding],
    step: usize,
) -> SimResult<()> {
    for binding in bindings {
        let series = &time_series[binding.series];
        let kind = series.variable_kind();
        let value = series.value(binding.unit).ok_or_else(|| SimError::Step {
            step,
            source: StepError::ForcingExhausted {
                variable: kind.to_string(),
            },
        })?;
        if let Some(forcing) = structure.unit_forcing_mut(binding.unit, kind) {
            forcing.update(value);
        }
    }
    Ok(())
}
