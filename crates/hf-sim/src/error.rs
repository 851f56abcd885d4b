//! Error types for model building and simulation.
//!
//! Two channels are kept apart: [`BuildError`] aborts construction of the
//! model, [`StepError`] aborts a run at a given time step. [`SimError`] is
//! what the driver reports to its caller.

use hf_components::ComponentError;
use hf_core::CoreError;
use hf_graph::GraphError;
use thiserror::Error;

/// Fatal configuration errors raised while assembling a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Unsupported {what} type: '{tag}'")]
    UnsupportedType { what: &'static str, tag: String },

    #[error("Not implemented: {what}")]
    NotImplemented { what: String },

    #[error("Conception issue: {what}")]
    ConceptionIssue { what: String },

    #[error("Should not happen: {what}")]
    ShouldNotHappen { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArgument { what: String },

    #[error("Component error: {0}")]
    Component(ComponentError),

    #[error("Graph error: {0}")]
    Graph(String),
}

pub type BuildResult<T> = Result<T, BuildError>;

impl From<ComponentError> for BuildError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::UnsupportedType { what, tag } => BuildError::UnsupportedType { what, tag },
            ComponentError::NotImplemented { what } => BuildError::NotImplemented { what },
            ComponentError::ConceptionIssue { what } => BuildError::ConceptionIssue { what },
            ComponentError::InvalidArg { what } => BuildError::InvalidArgument { what },
            other => BuildError::Component(other),
        }
    }
}

impl From<GraphError> for BuildError {
    fn from(e: GraphError) -> Self {
        BuildError::Graph(e.to_string())
    }
}

impl From<CoreError> for BuildError {
    fn from(e: CoreError) -> Self {
        BuildError::Graph(e.to_string())
    }
}

/// Runtime errors aborting the time loop at one step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Forcing '{variable}' has no data left")]
    ForcingExhausted { variable: String },

    #[error("Invalid configuration: {what}")]
    InvalidConfiguration { what: String },

    #[error("Non-finite {what} in slot {slot}")]
    NonFinite { what: &'static str, slot: usize },
}

pub type StepResult<T> = Result<T, StepError>;

/// Errors reported by the model driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Step {step} failed: {source}")]
    Step { step: usize, source: StepError },

    #[error("Invalid state: {what}")]
    InvalidState { what: &'static str },
}

pub type SimResult<T> = Result<T, SimError>;
