//! hf-components: component behaviour for hydroflow.
//!
//! Provides the pieces attached to flow-graph nodes and edges:
//! - Bricks (storages and land covers) with their constraints
//! - Outflow processes, pure functions of a brick's content
//! - Splitters redistributing incoming water
//! - Fluxes, forcings and time-indexed parameters
//!
//! Components never alias each other's memory. Rates travel through a
//! shared slice indexed by rate slots, values are observed through
//! [`ValueRef`]s.
//!
//! # Example
//!
//! ```
//! use hf_components::{Brick, BrickKind, EvalContext, Link, Parameter, ProcessKind};
//! use hf_core::{FluxId, NodeId};
//! use chrono::NaiveDate;
//!
//! let params = [Parameter::constant("response_factor", 0.2)].into_iter().collect();
//! let mut brick = Brick::new("slow", BrickKind::Storage, NodeId::from_index(0), 0, params).unwrap();
//! brick.attach_output(Link::new(FluxId::from_index(0), 0));
//! brick.configure_process(ProcessKind::OutflowLinear).unwrap();
//!
//! let ctx = EvalContext::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
//! let mut rates = [0.0];
//! brick.write_rates(10.0, &ctx, &mut rates);
//! assert_eq!(rates[0], 2.0);
//! assert_eq!(brick.net_rate(&rates), -2.0);
//! ```

pub mod brick;
pub mod common;
pub mod error;
pub mod flux;
pub mod forcing;
pub mod parameter;
pub mod process;
pub mod splitter;
pub mod value;

// Re-exports
pub use brick::{Brick, BrickKind};
pub use error::{ComponentError, ComponentResult};
pub use flux::{Flux, FluxKind, FluxOrigin, Link};
pub use forcing::{Forcing, VariableKind};
pub use parameter::{EvalContext, Parameter, ParameterSet, ParameterValue};
pub use process::{Process, ProcessKind};
pub use splitter::{SplitPolicy, SplitterKind, Splitter};
pub use value::ValueRef;
