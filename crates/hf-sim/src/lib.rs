//! Hydrological simulation engine for hydroflow.
//!
//! Provides:
//! - Model structure assembly from settings (bricks, fluxes, splitters, forcings per unit)
//! - Explicit solvers (Euler, Heun, RK4) over flux rates, with constraints
//! - Processor owning the state and rate buffers, with sub-stepping
//! - Timer, forcing time series and output logger
//! - `ModelHydro`, the driver running the time loop

pub mod builder;
pub mod driver;
pub mod error;
pub mod logger;
pub mod model;
pub mod processor;
pub mod solver;
pub mod structure;
pub mod timer;
pub mod timeseries;

// Re-exports for public API
pub use builder::build_model_structure;
pub use driver::{ModelHydro, ModelState};
pub use error::{BuildError, BuildResult, SimError, SimResult, StepError, StepResult};
pub use logger::{LogSummary, Logger};
pub use model::RateModel;
pub use processor::Processor;
pub use solver::{EulerExplicit, HeunExplicit, Integrator, RungeKutta4, SolverKind};
pub use structure::{HydroUnit, ModelStructure, OUTLET_LABEL};
pub use timer::{TimeUnit, Timer};
pub use timeseries::{TimeSeries, UniformTimeSeries};
