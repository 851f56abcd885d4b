//! Core graph data structures.

use hf_core::{FluxId, NodeId, PortId, UnitId};

/// Which end of a flux a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// The flux leaves this node.
    Upstream,
    /// The flux enters this node.
    Downstream,
}

/// Role of a node in the flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A brick. Only state-bearing bricks get a slot in the state vector.
    Brick { state_bearing: bool },
    /// Zero-storage node redistributing incoming amounts.
    Splitter,
    /// Source of an external driving input. Never a flux target.
    Forcing,
    /// Basin outlet sink. Never a flux source.
    Outlet,
}

/// A node in the flow graph.
///
/// Nodes hold no water themselves; the component layer attaches
/// behaviour to them by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Owning spatial unit. `None` for basin-level nodes (the outlet).
    pub unit: Option<UnitId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_state_bearing(&self) -> bool {
        matches!(self.kind, NodeKind::Brick { state_bearing: true })
    }
}

/// A port connects one end of a flux to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    pub flux: FluxId,
    pub node: NodeId,
    pub kind: PortKind,
}

/// A directed, valued edge carrying water between two nodes.
///
/// Each flux has exactly 2 ports: one upstream, one downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxEdge {
    pub id: FluxId,
    pub name: String,
    /// Exactly 2 ports: [upstream_port_id, downstream_port_id].
    pub ports: [PortId; 2],
}

impl FluxEdge {
    pub fn upstream(&self) -> PortId {
        self.ports[0]
    }

    pub fn downstream(&self) -> PortId {
        self.ports[1]
    }
}

/// The graph: a validated, immutable collection of nodes, fluxes, and ports.
///
/// Topology is frozen once built; only the values the component layer
/// keeps per node and flux change during a run.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) fluxes: Vec<FluxEdge>,
    pub(crate) ports: Vec<Port>,
    pub(crate) outlet: Option<NodeId>,

    /// Offsets for node->port adjacency: node i's ports are in node_ports[node_port_offsets[i]..node_port_offsets[i+1]].
    pub(crate) node_port_offsets: Vec<usize>,

    /// Flat list of port IDs incident to nodes (sorted by node ID then port ID for determinism).
    pub(crate) node_ports: Vec<PortId>,
}

impl Graph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn fluxes(&self) -> &[FluxEdge] {
        &self.fluxes
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// The basin outlet, if one was declared.
    pub fn outlet(&self) -> Option<NodeId> {
        self.outlet
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub fn flux(&self, id: FluxId) -> Option<&FluxEdge> {
        self.fluxes.get(id.slot())
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.slot())
    }

    /// Find a node by name within a unit (or among basin-level nodes for `None`).
    pub fn find_node(&self, unit: Option<UnitId>, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.unit == unit && n.name == name)
            .map(|n| n.id)
    }

    /// All port IDs incident to a given node.
    pub fn node_ports(&self, node_id: NodeId) -> &[PortId] {
        let idx = node_id.slot();
        if idx >= self.nodes.len() {
            return &[];
        }
        let start = self.node_port_offsets[idx];
        let end = self.node_port_offsets[idx + 1];
        &self.node_ports[start..end]
    }

    /// Fluxes entering a node, in flux declaration order.
    pub fn incoming(&self, node_id: NodeId) -> impl Iterator<Item = FluxId> + '_ {
        self.fluxes_at(node_id, PortKind::Downstream)
    }

    /// Fluxes leaving a node, in flux declaration order.
    pub fn outgoing(&self, node_id: NodeId) -> impl Iterator<Item = FluxId> + '_ {
        self.fluxes_at(node_id, PortKind::Upstream)
    }

    fn fluxes_at(&self, node_id: NodeId, kind: PortKind) -> impl Iterator<Item = FluxId> + '_ {
        self.node_ports(node_id)
            .iter()
            .filter_map(move |&p| self.port(p).filter(|port| port.kind == kind))
            .map(|port| port.flux)
    }

    /// Source node of a flux.
    pub fn flux_source(&self, flux_id: FluxId) -> Option<NodeId> {
        let flux = self.flux(flux_id)?;
        Some(self.port(flux.upstream())?.node)
    }

    /// Target node of a flux.
    pub fn flux_target(&self, flux_id: FluxId) -> Option<NodeId> {
        let flux = self.flux(flux_id)?;
        Some(self.port(flux.downstream())?.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_core::Id;

    #[test]
    fn port_kind_equality() {
        assert_eq!(PortKind::Upstream, PortKind::Upstream);
        assert_ne!(PortKind::Upstream, PortKind::Downstream);
    }

    #[test]
    fn flux_accessors() {
        let flux = FluxEdge {
            id: Id::from_index(0),
            name: "f".into(),
            ports: [Id::from_index(10), Id::from_index(11)],
        };
        assert_eq!(flux.upstream().index(), 10);
        assert_eq!(flux.downstream().index(), 11);
    }

    #[test]
    fn only_state_bearing_bricks_count() {
        let mut node = Node {
            id: Id::from_index(0),
            name: "n".into(),
            unit: None,
            kind: NodeKind::Brick {
                state_bearing: true,
            },
        };
        assert!(node.is_state_bearing());
        node.kind = NodeKind::Splitter;
        assert!(!node.is_state_bearing());
    }
}
