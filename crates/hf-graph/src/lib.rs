//! hf-graph: flow-graph layer for hydroflow.
//!
//! Provides:
//! - Core graph data structures (Node, Flux, Port, Graph)
//! - Incremental graph builder with validation
//! - Stable state/rate slot indexing for the solver
//!
//! # Example
//!
//! ```
//! use hf_graph::{GraphBuilder, NodeKind};
//! use hf_core::UnitId;
//!
//! let unit = UnitId::from_index(0);
//! let mut builder = GraphBuilder::new();
//! let rain = builder.add_node("precipitation", Some(unit), NodeKind::Forcing);
//! let store = builder.add_node("slow", Some(unit), NodeKind::Brick { state_bearing: true });
//! let outlet = builder.add_outlet();
//! builder.add_flux("rain->slow", rain, store);
//! builder.add_flux("slow->outlet", store, outlet);
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.nodes().len(), 3);
//! assert_eq!(graph.fluxes().len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod indexing;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use error::GraphError;
pub use graph::{FluxEdge, Graph, Node, NodeKind, Port, PortKind};
pub use indexing::IndexMap;
