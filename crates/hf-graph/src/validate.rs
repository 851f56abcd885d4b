//! Graph validation logic.

use std::collections::HashSet;

use hf_core::{CoreResult, NodeId, PortId, UnitId};

use crate::error::GraphError;
use crate::graph::{FluxEdge, Node, NodeKind, Port, PortKind};

/// Validate the graph structure: all references exist, ports are consistent,
/// and flux directions respect the forcing/outlet roles.
pub(crate) fn validate_structure(
    nodes: &[Node],
    fluxes: &[FluxEdge],
    ports: &[Port],
) -> CoreResult<()> {
    for (i, port) in ports.iter().enumerate() {
        if port.id.slot() != i {
            return Err(GraphError::InconsistentAdjacency {
                port: port.id,
                node: port.node,
            }
            .into());
        }
    }

    for port in ports {
        if port.node.slot() >= nodes.len() {
            return Err(GraphError::InvalidNodeRef {
                port: port.id,
                node: port.node,
            }
            .into());
        }
        if port.flux.slot() >= fluxes.len() {
            return Err(GraphError::InvalidFluxRef {
                port: port.id,
                flux: port.flux,
            }
            .into());
        }
    }

    let mut names: HashSet<(Option<UnitId>, &str)> = HashSet::new();
    for node in nodes {
        if !names.insert((node.unit, node.name.as_str())) {
            return Err(GraphError::DuplicateName {
                name: node.name.clone(),
            }
            .into());
        }
    }

    for flux in fluxes {
        if flux.ports[0] == flux.ports[1] {
            return Err(GraphError::DuplicatePorts { flux: flux.id }.into());
        }

        for &port_id in &flux.ports {
            let Some(port) = ports.get(port_id.slot()) else {
                return Err(GraphError::InvalidFluxRef {
                    port: port_id,
                    flux: flux.id,
                }
                .into());
            };
            if port.flux != flux.id {
                return Err(GraphError::PortFluxMismatch {
                    port: port_id,
                    expected: flux.id,
                    actual: port.flux,
                }
                .into());
            }
            let node = &nodes[port.node.slot()];
            match (port.kind, node.kind) {
                (PortKind::Upstream, NodeKind::Outlet) => {
                    return Err(GraphError::FluxFromOutlet { flux: flux.id }.into());
                }
                (PortKind::Downstream, NodeKind::Forcing) => {
                    return Err(GraphError::FluxIntoForcing { flux: flux.id }.into());
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Validate adjacency lists for consistency.
pub(crate) fn validate_adjacency(
    nodes: &[Node],
    ports: &[Port],
    node_port_offsets: &[usize],
    node_ports: &[PortId],
) -> CoreResult<()> {
    if node_port_offsets.len() != nodes.len() + 1 {
        return Err(GraphError::InconsistentAdjacency {
            port: PortId::from_index(0),
            node: nodes.first().map_or(NodeId::from_index(0), |n| n.id),
        }
        .into());
    }

    for node in nodes {
        let idx = node.id.slot();
        let start = node_port_offsets[idx];
        let end = node_port_offsets[idx + 1];

        for &port_id in &node_ports[start..end] {
            let consistent = ports
                .get(port_id.slot())
                .is_some_and(|port| port.node == node.id);
            if !consistent {
                return Err(GraphError::InconsistentAdjacency {
                    port: port_id,
                    node: node.id,
                }
                .into());
            }
        }
    }

    // Every port appears in exactly one node's adjacency list
    let mut ports_in_adj: HashSet<PortId> = HashSet::new();
    for &port_id in node_ports {
        if !ports_in_adj.insert(port_id) {
            return Err(GraphError::InconsistentAdjacency {
                port: port_id,
                node: ports[port_id.slot()].node,
            }
            .into());
        }
    }
    for port in ports {
        if !ports_in_adj.contains(&port.id) {
            return Err(GraphError::InconsistentAdjacency {
                port: port.id,
                node: port.node,
            }
            .into());
        }
    }

    Ok(())
}
