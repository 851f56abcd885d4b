//! Integration tests for hf-graph.

use hf_core::UnitId;
use hf_graph::{GraphBuilder, IndexMap, NodeKind, PortKind};

const STORE: NodeKind = NodeKind::Brick {
    state_bearing: true,
};

#[test]
fn build_minimal_chain() {
    // rain -> A -> B -> outlet
    let unit = Some(UnitId::from_index(0));
    let mut builder = GraphBuilder::new();
    let rain = builder.add_node("precipitation", unit, NodeKind::Forcing);
    let a = builder.add_node("A", unit, STORE);
    let b = builder.add_node("B", unit, STORE);
    let outlet = builder.add_outlet();
    let f_rain = builder.add_flux("rain", rain, a);
    let f_ab = builder.add_flux("A->B", a, b);
    let f_out = builder.add_flux("B->outlet", b, outlet);

    let graph = builder.build().unwrap();

    assert_eq!(graph.nodes().len(), 4);
    assert_eq!(graph.fluxes().len(), 3);
    assert_eq!(graph.ports().len(), 6);

    assert_eq!(graph.incoming(a).collect::<Vec<_>>(), vec![f_rain]);
    assert_eq!(graph.outgoing(a).collect::<Vec<_>>(), vec![f_ab]);
    assert_eq!(graph.incoming(b).collect::<Vec<_>>(), vec![f_ab]);
    assert_eq!(graph.outgoing(b).collect::<Vec<_>>(), vec![f_out]);

    let edge = graph.flux(f_ab).unwrap();
    let up = graph.port(edge.upstream()).unwrap();
    let down = graph.port(edge.downstream()).unwrap();
    assert_eq!(up.node, a);
    assert_eq!(up.kind, PortKind::Upstream);
    assert_eq!(down.node, b);
    assert_eq!(down.kind, PortKind::Downstream);

    assert_eq!(graph.flux_source(f_out), Some(b));
    assert_eq!(graph.flux_target(f_out), Some(outlet));
}

#[test]
fn units_share_the_outlet() {
    let mut builder = GraphBuilder::new();
    let mut stores = Vec::new();
    for u in 0..3 {
        let unit = Some(UnitId::from_index(u));
        let store = builder.add_node("slow", unit, STORE);
        let outlet = builder.add_outlet();
        builder.add_flux("slow->outlet", store, outlet);
        stores.push(store);
    }
    let graph = builder.build().unwrap();
    let outlet = graph.outlet().unwrap();

    assert_eq!(graph.incoming(outlet).count(), 3);
    for (u, store) in stores.iter().enumerate() {
        assert_eq!(
            graph.find_node(Some(UnitId::from_index(u as u32)), "slow"),
            Some(*store)
        );
    }

    let index = IndexMap::from_graph(&graph);
    assert_eq!(index.state_count(), 3);
    assert_eq!(index.rate_count(), 3);
}

#[test]
fn identical_graphs_get_identical_slots() {
    let build = || {
        let unit = Some(UnitId::from_index(0));
        let mut builder = GraphBuilder::new();
        let a = builder.add_node("A", unit, STORE);
        let s = builder.add_node("S", unit, NodeKind::Splitter);
        let b = builder.add_node("B", unit, STORE);
        builder.add_flux("A->S", a, s);
        builder.add_flux("S->B", s, b);
        IndexMap::from_graph(&builder.build().unwrap())
    };
    let first = build();
    let second = build();
    assert_eq!(first.state_nodes(), second.state_nodes());
    assert_eq!(first.rate_fluxes(), second.rate_fluxes());
}

#[test]
fn flux_out_of_outlet_fails_build() {
    let mut builder = GraphBuilder::new();
    let store = builder.add_node("A", Some(UnitId::from_index(0)), STORE);
    let outlet = builder.add_outlet();
    builder.add_flux("bad", outlet, store);
    assert!(builder.build().is_err());
}
