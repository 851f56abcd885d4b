//! Processor: owns the state and rate buffers and runs one time step.

use hf_components::EvalContext;
use hf_project::SolverDef;
use nalgebra::{DMatrix, DVector};
use tracing::error;

use crate::error::{BuildError, BuildResult, StepError, StepResult};
use crate::model::RateModel;
use crate::solver::{Integrator, SolverKind};
use crate::structure::ModelStructure;

#[derive(Debug, Clone)]
pub struct Processor {
    solver: SolverKind,
    iterations: usize,
    /// State after each sub-step, one column per sub-step.
    states: DMatrix<f64>,
    /// Effective flux rates of each sub-step, one column per sub-step.
    rates: DMatrix<f64>,
}

impl Processor {
    pub fn new(settings: &SolverDef) -> BuildResult<Self> {
        let solver = SolverKind::from_name(&settings.name)?;
        if settings.iterations == 0 {
            return Err(BuildError::InvalidArgument {
                what: "solver iterations must be at least 1".to_string(),
            });
        }
        Ok(Self::with_solver(solver, settings.iterations as usize))
    }

    pub fn with_solver(solver: SolverKind, iterations: usize) -> Self {
        Self {
            solver,
            iterations: iterations.max(1),
            states: DMatrix::zeros(0, 0),
            rates: DMatrix::zeros(0, 0),
        }
    }

    /// Allocate the buffers from the structure counts. Called once per build.
    pub fn initialize(&mut self, structure: &ModelStructure) {
        self.states = DMatrix::zeros(structure.state_count(), self.iterations);
        self.rates = DMatrix::zeros(structure.rate_count(), self.iterations);
    }

    pub fn solver(&self) -> SolverKind {
        self.solver
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn state_buffer(&self) -> &DMatrix<f64> {
        &self.states
    }

    pub fn rate_buffer(&self) -> &DMatrix<f64> {
        &self.rates
    }

    /// Advance the structure by one external time step of `dt` days.
    pub fn process_time_step(
        &mut self,
        structure: &mut ModelStructure,
        ctx: EvalContext,
        dt: f64,
    ) -> StepResult<()> {
        if self.states.nrows() != structure.state_len() || self.rates.nrows() != structure.rate_len()
        {
            return Err(StepError::InvalidConfiguration {
                what: "processor buffers do not match the structure".to_string(),
            });
        }
        if !structure.is_ok() {
            return Err(StepError::InvalidConfiguration {
                what: "a model component failed its checks".to_string(),
            });
        }
        structure.set_context(ctx);

        let sub_dt = dt / self.iterations as f64;
        let mut state = structure.state_vector();
        let mut effective = DVector::zeros(structure.rate_len());
        let mut amounts = DVector::zeros(structure.rate_len());

        for j in 0..self.iterations {
            let start = state.clone();
            self.solver.step(&*structure, &mut state, sub_dt, &mut effective)?;
            structure.reconcile(&start, &mut effective, sub_dt, &mut state);

            if let Some(slot) = state.iter().position(|v| !v.is_finite()) {
                error!(slot, "non-finite state after solver step");
                return Err(StepError::NonFinite { what: "state", slot });
            }
            if let Some(slot) = effective.iter().position(|v| !v.is_finite()) {
                error!(slot, "non-finite flux rate after solver step");
                return Err(StepError::NonFinite { what: "rate", slot });
            }

            self.states.set_column(j, &state);
            self.rates.set_column(j, &effective);
            amounts.axpy(sub_dt, &effective, 1.0);
        }

        structure.commit(&state, &amounts);
        Ok(())
    }
}
