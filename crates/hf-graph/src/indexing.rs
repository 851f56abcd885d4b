//! Stable indexing for solver integration.
//!
//! Maps state-bearing nodes to contiguous state slots (0..N) and fluxes to
//! contiguous rate slots (0..M). Slots are assigned once, after the graph is
//! frozen, and never change for the lifetime of a run.

use hf_core::{CoreResult, FluxId, NodeId};

use crate::error::GraphError;
use crate::graph::Graph;

/// Index map providing stable, contiguous slots for graph objects.
#[derive(Debug, Clone)]
pub struct IndexMap {
    /// State slot -> node.
    state_nodes: Vec<NodeId>,

    /// Rate slot -> flux.
    rate_fluxes: Vec<FluxId>,

    /// Reverse lookup: NodeId -> state slot (None for nodes without state).
    node_to_state: Vec<Option<usize>>,

    /// Reverse lookup: FluxId -> rate slot.
    flux_to_rate: Vec<Option<usize>>,
}

impl IndexMap {
    /// Build an index map from a graph.
    ///
    /// State slots follow node declaration order, which is unit-major when
    /// the graph is assembled unit by unit.
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph.nodes();
        let fluxes = graph.fluxes();

        let state_nodes: Vec<NodeId> = nodes
            .iter()
            .filter(|n| n.is_state_bearing())
            .map(|n| n.id)
            .collect();
        let rate_fluxes: Vec<FluxId> = fluxes.iter().map(|f| f.id).collect();

        let mut node_to_state = vec![None; nodes.len()];
        for (i, &id) in state_nodes.iter().enumerate() {
            node_to_state[id.slot()] = Some(i);
        }
        let mut flux_to_rate = vec![None; fluxes.len()];
        for (i, &id) in rate_fluxes.iter().enumerate() {
            flux_to_rate[id.slot()] = Some(i);
        }

        Self {
            state_nodes,
            rate_fluxes,
            node_to_state,
            flux_to_rate,
        }
    }

    /// Number of entries in the state vector.
    pub fn state_count(&self) -> usize {
        self.state_nodes.len()
    }

    /// Number of entries in the change-rate vector.
    pub fn rate_count(&self) -> usize {
        self.rate_fluxes.len()
    }

    /// State slot of a node, `None` if the node carries no state.
    pub fn state_slot(&self, id: NodeId) -> Option<usize> {
        self.node_to_state.get(id.slot()).copied().flatten()
    }

    /// State slot of a node that must carry state.
    pub fn require_state_slot(&self, id: NodeId) -> CoreResult<usize> {
        self.state_slot(id)
            .ok_or_else(|| GraphError::IdNotFound { what: "state NodeId" }.into())
    }

    /// Rate slot of a flux.
    pub fn rate_slot(&self, id: FluxId) -> CoreResult<usize> {
        self.flux_to_rate
            .get(id.slot())
            .copied()
            .flatten()
            .ok_or_else(|| GraphError::IdNotFound { what: "FluxId" }.into())
    }

    /// Node owning a state slot (panics if out of bounds).
    pub fn state_node(&self, i: usize) -> NodeId {
        self.state_nodes[i]
    }

    /// Flux owning a rate slot (panics if out of bounds).
    pub fn rate_flux(&self, i: usize) -> FluxId {
        self.rate_fluxes[i]
    }

    pub fn state_nodes(&self) -> &[NodeId] {
        &self.state_nodes
    }

    pub fn rate_fluxes(&self) -> &[FluxId] {
        &self.rate_fluxes
    }
}
