//! Incremental graph builder.

use std::collections::HashMap;

use hf_core::{CoreResult, FluxId, NodeId, PortId, UnitId};

use crate::graph::{FluxEdge, Graph, Node, NodeKind, Port, PortKind};
use crate::validate;

/// Builder for constructing a flow graph incrementally.
///
/// Use `add_node`, `add_outlet` and `add_flux` to build up the graph,
/// then call `build()` to validate and freeze it into an immutable `Graph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    fluxes: Vec<FluxEdge>,
    ports: Vec<Port>,
    outlet: Option<NodeId>,
    next_node_id: u32,
    next_flux_id: u32,
    next_port_id: u32,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph and return its ID.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        unit: Option<UnitId>,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId::from_index(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.push(Node {
            id,
            name: name.into(),
            unit,
            kind,
        });
        id
    }

    /// Return the basin outlet, creating it on first use.
    pub fn add_outlet(&mut self) -> NodeId {
        if let Some(outlet) = self.outlet {
            return outlet;
        }
        let id = self.add_node("outlet", None, NodeKind::Outlet);
        self.outlet = Some(id);
        id
    }

    /// Add a flux from `source` to `target`.
    ///
    /// Automatically creates two ports (upstream, downstream) and attaches them to the nodes.
    pub fn add_flux(&mut self, name: impl Into<String>, source: NodeId, target: NodeId) -> FluxId {
        let flux_id = FluxId::from_index(self.next_flux_id);
        self.next_flux_id += 1;

        let upstream_port = self.push_port(flux_id, source, PortKind::Upstream);
        let downstream_port = self.push_port(flux_id, target, PortKind::Downstream);

        self.fluxes.push(FluxEdge {
            id: flux_id,
            name: name.into(),
            ports: [upstream_port, downstream_port],
        });

        flux_id
    }

    fn push_port(&mut self, flux: FluxId, node: NodeId, kind: PortKind) -> PortId {
        let id = PortId::from_index(self.next_port_id);
        self.next_port_id += 1;
        self.ports.push(Port {
            id,
            flux,
            node,
            kind,
        });
        id
    }

    /// Look up a node added so far by unit and name.
    pub fn find_node(&self, unit: Option<UnitId>, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.unit == unit && n.name == name)
            .map(|n| n.id)
    }

    /// Look up a node of a given kind in a unit by name.
    pub fn find_node_of_kind(
        &self,
        unit: Option<UnitId>,
        name: &str,
        kind: NodeKind,
    ) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.unit == unit && n.name == name && n.kind == kind)
            .map(|n| n.id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn flux_count(&self) -> usize {
        self.fluxes.len()
    }

    /// Build and validate the graph, returning an immutable `Graph`.
    ///
    /// This performs validation and constructs compact adjacency lists.
    pub fn build(self) -> CoreResult<Graph> {
        validate::validate_structure(&self.nodes, &self.fluxes, &self.ports)?;

        let (node_port_offsets, node_ports) = Self::build_adjacency(&self.nodes, &self.ports);

        validate::validate_adjacency(&self.nodes, &self.ports, &node_port_offsets, &node_ports)?;

        Ok(Graph {
            nodes: self.nodes,
            fluxes: self.fluxes,
            ports: self.ports,
            outlet: self.outlet,
            node_port_offsets,
            node_ports,
        })
    }

    /// Build compact adjacency lists: for each node, collect its incident ports.
    fn build_adjacency(nodes: &[Node], ports: &[Port]) -> (Vec<usize>, Vec<PortId>) {
        let mut node_to_ports: HashMap<NodeId, Vec<PortId>> = HashMap::new();
        for port in ports {
            node_to_ports.entry(port.node).or_default().push(port.id);
        }

        // Sort each node's port list for determinism
        for ports_list in node_to_ports.values_mut() {
            ports_list.sort_by_key(|p| p.index());
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        let mut flat_ports = Vec::new();
        offsets.push(0);

        for node in nodes {
            if let Some(ports_list) = node_to_ports.get(&node.id) {
                flat_ports.extend_from_slice(ports_list);
            }
            offsets.push(flat_ports.len());
        }

        (offsets, flat_ports)
    }
}
