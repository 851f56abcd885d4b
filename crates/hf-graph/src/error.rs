//! Graph-specific error types.

use hf_core::{CoreError, FluxId, NodeId, PortId};

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A port refers to a node that doesn't exist.
    InvalidNodeRef { port: PortId, node: NodeId },

    /// A port refers to a flux that doesn't exist.
    InvalidFluxRef { port: PortId, flux: FluxId },

    /// A flux has the same port twice.
    DuplicatePorts { flux: FluxId },

    /// A port's flux field doesn't match the flux containing it.
    PortFluxMismatch {
        port: PortId,
        expected: FluxId,
        actual: FluxId,
    },

    /// Adjacency list is inconsistent (port in node's list but port doesn't reference node).
    InconsistentAdjacency { port: PortId, node: NodeId },

    /// A flux leaves the basin outlet.
    FluxFromOutlet { flux: FluxId },

    /// A flux enters a forcing node.
    FluxIntoForcing { flux: FluxId },

    /// Two nodes of the same unit share a name.
    DuplicateName { name: String },

    /// ID not found in index map.
    IdNotFound { what: &'static str },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidNodeRef { port, node } => {
                write!(f, "Port {} refers to non-existent node {}", port, node)
            }
            GraphError::InvalidFluxRef { port, flux } => {
                write!(f, "Port {} refers to non-existent flux {}", port, flux)
            }
            GraphError::DuplicatePorts { flux } => {
                write!(f, "Flux {} has duplicate port IDs", flux)
            }
            GraphError::PortFluxMismatch {
                port,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Port {} should belong to flux {} but references {}",
                    port, expected, actual
                )
            }
            GraphError::InconsistentAdjacency { port, node } => {
                write!(
                    f,
                    "Port {} in node {}'s adjacency list but doesn't reference that node",
                    port, node
                )
            }
            GraphError::FluxFromOutlet { flux } => {
                write!(f, "Flux {} leaves the basin outlet", flux)
            }
            GraphError::FluxIntoForcing { flux } => {
                write!(f, "Flux {} targets a forcing node", flux)
            }
            GraphError::DuplicateName { name } => {
                write!(f, "Node name '{}' is used twice in the same unit", name)
            }
            GraphError::IdNotFound { what } => {
                write!(f, "{} not found in index map", what)
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for CoreError {
    fn from(err: GraphError) -> Self {
        CoreError::Invariant {
            what: err.to_string(),
        }
    }
}
