//! Model structure builder: settings in, frozen structure out.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use hf_components::{
    Brick, BrickKind, EvalContext, Flux, FluxKind, FluxOrigin, Forcing, Link, Parameter,
    ParameterSet, ParameterValue, ProcessKind, SplitPolicy, Splitter, SplitterKind, VariableKind,
};
use hf_core::{NodeId, UnitId, same_tag};
use hf_graph::{Graph, GraphBuilder, IndexMap, NodeKind};
use hf_project::{
    BrickDef, HydroUnitDef, ModelStructureDef, OUTLET_TARGET, OutputDef, ParameterDef, Project,
    SplitterDef,
};
use tracing::{debug, info};

use crate::error::{BuildError, BuildResult};
use crate::structure::{HydroUnit, ModelStructure};

/// Brick settings with every tag resolved.
struct BrickPlan<'a> {
    def: &'a BrickDef,
    kind: BrickKind,
    process: ProcessKind,
    parameters: ParameterSet,
    forcing: Vec<VariableKind>,
}

struct SplitterPlan<'a> {
    def: &'a SplitterDef,
    kind: SplitterKind,
    policy: SplitPolicy,
}

/// Build the structure `structure_id` of `project` over `units`.
///
/// Every tag is resolved before any node is created, so configuration errors
/// surface regardless of the number of units.
pub fn build_model_structure(
    project: &Project,
    structure_id: u32,
    units: &[HydroUnitDef],
) -> BuildResult<ModelStructure> {
    if project.structures.len() > 1 {
        return Err(BuildError::NotImplemented {
            what: "building a model with more than one structure".to_string(),
        });
    }
    let def = project
        .structures
        .iter()
        .find(|s| s.id == structure_id)
        .ok_or_else(|| BuildError::InvalidArgument {
            what: format!("no model structure with id {structure_id}"),
        })?;

    let bricks = def
        .bricks
        .iter()
        .map(plan_brick)
        .collect::<BuildResult<Vec<_>>>()?;
    let splitters = def
        .splitters
        .iter()
        .map(plan_splitter)
        .collect::<BuildResult<Vec<_>>>()?;
    check_outputs(def)?;
    if units.is_empty() {
        return Err(BuildError::InvalidArgument {
            what: "at least one hydro unit is required".to_string(),
        });
    }

    let mut builder = StructureBuilder::new(project.timer.start);
    for (u, unit) in units.iter().enumerate() {
        builder.add_unit(UnitId::from_index(u as u32), unit, &bricks, &splitters)?;
    }
    let structure = builder.finish(&bricks, &splitters)?;

    info!(
        structure = structure_id,
        units = units.len(),
        states = structure.state_count(),
        fluxes = structure.rate_count(),
        "model structure built"
    );
    Ok(structure)
}

fn plan_brick(def: &BrickDef) -> BuildResult<BrickPlan<'_>> {
    let kind = BrickKind::from_tag(&def.kind)?;
    let process = match &def.process {
        Some(tag) => ProcessKind::from_tag(tag)?,
        None => ProcessKind::default(),
    };
    let parameters = def
        .parameters
        .iter()
        .map(parameter_from_def)
        .collect::<BuildResult<ParameterSet>>()?;
    let forcing = def
        .forcing
        .iter()
        .map(|name| {
            let kind = VariableKind::from_name(name)?;
            if kind.is_water_input() {
                Ok(kind)
            } else {
                Err(BuildError::InvalidArgument {
                    what: format!("forcing '{name}' cannot feed brick '{}'", def.name),
                })
            }
        })
        .collect::<BuildResult<Vec<_>>>()?;
    Ok(BrickPlan {
        def,
        kind,
        process,
        parameters,
        forcing,
    })
}

fn plan_splitter(def: &SplitterDef) -> BuildResult<SplitterPlan<'_>> {
    let kind = SplitterKind::from_tag(&def.kind)?;
    let policy = match def.policy.as_deref() {
        None => SplitPolicy::Broadcast,
        Some(tag) if same_tag(tag, "broadcast") => SplitPolicy::Broadcast,
        Some(tag) if same_tag(tag, "proportional") => {
            SplitPolicy::Proportional(def.fractions.clone())
        }
        Some(tag) => {
            return Err(BuildError::UnsupportedType {
                what: "split policy",
                tag: tag.to_string(),
            });
        }
    };
    Ok(SplitterPlan { def, kind, policy })
}

fn parameter_from_def(def: &ParameterDef) -> BuildResult<Parameter> {
    let missing = || BuildError::InvalidArgument {
        what: format!("parameter '{}' has no value", def.name),
    };
    let value = if same_tag(&def.kind, "constant") {
        ParameterValue::Constant(def.value.ok_or_else(missing)?)
    } else if same_tag(&def.kind, "monthly") {
        let values: [f64; 12] =
            def.values
                .as_slice()
                .try_into()
                .map_err(|_| BuildError::InvalidArgument {
                    what: format!("monthly parameter '{}' needs 12 values", def.name),
                })?;
        ParameterValue::Monthly(values)
    } else if same_tag(&def.kind, "yearly") {
        let first = def.first_year.ok_or_else(missing)?;
        let last = def.last_year.ok_or_else(missing)?;
        ParameterValue::yearly(first, last, def.values.clone())?
    } else if same_tag(&def.kind, "dates") {
        ParameterValue::dates(def.dates.clone(), def.values.clone())?
    } else {
        return Err(BuildError::NotImplemented {
            what: format!("parameter kind '{}'", def.kind),
        });
    };
    Ok(Parameter {
        name: def.name.clone(),
        value,
    })
}

/// Every output must be a supported flux type.
fn check_outputs(def: &ModelStructureDef) -> BuildResult<()> {
    let outputs = def
        .bricks
        .iter()
        .flat_map(|b| &b.outputs)
        .chain(def.splitters.iter().flat_map(|s| &s.outputs));
    for output in outputs {
        FluxKind::from_tag(&output.kind)?;
    }
    Ok(())
}

/// Nodes created for one unit, by declaration position.
struct UnitNodes {
    id: UnitId,
    settings_id: u32,
    area: f64,
    bricks: Vec<NodeId>,
    splitters: Vec<NodeId>,
    /// Forcing node per variable, in creation order.
    forcing: Vec<(VariableKind, NodeId)>,
}

struct StructureBuilder {
    graph: GraphBuilder,
    outlet: NodeId,
    units: Vec<UnitNodes>,
    start: NaiveDate,
}

impl StructureBuilder {
    fn new(start: NaiveDate) -> Self {
        let mut graph = GraphBuilder::new();
        let outlet = graph.add_outlet();
        Self {
            graph,
            outlet,
            units: Vec::new(),
            start,
        }
    }

    fn add_unit(
        &mut self,
        id: UnitId,
        def: &HydroUnitDef,
        bricks: &[BrickPlan<'_>],
        splitters: &[SplitterPlan<'_>],
    ) -> BuildResult<()> {
        let mut nodes = UnitNodes {
            id,
            settings_id: def.id,
            area: def.area,
            bricks: Vec::with_capacity(bricks.len()),
            splitters: Vec::with_capacity(splitters.len()),
            forcing: Vec::new(),
        };

        for plan in bricks {
            let node = self.graph.add_node(
                plan.def.name.as_str(),
                Some(id),
                NodeKind::Brick {
                    state_bearing: plan.kind.is_state_bearing(),
                },
            );
            for &kind in &plan.forcing {
                let source = match nodes.forcing.iter().find(|(k, _)| *k == kind) {
                    Some(&(_, existing)) => existing,
                    None => {
                        let created =
                            self.graph
                                .add_node(format!("forcing:{kind}"), Some(id), NodeKind::Forcing);
                        nodes.forcing.push((kind, created));
                        created
                    }
                };
                self.graph
                    .add_flux(format!("{kind}->{}", plan.def.name), source, node);
            }
            nodes.bricks.push(node);
        }

        for plan in splitters {
            let node = self
                .graph
                .add_node(plan.def.name.as_str(), Some(id), NodeKind::Splitter);
            nodes.splitters.push(node);
        }

        for (plan, &source) in bricks.iter().zip(&nodes.bricks) {
            self.add_outputs(&nodes, &plan.def.name, source, &plan.def.outputs)?;
        }
        for (plan, &source) in splitters.iter().zip(&nodes.splitters) {
            self.add_outputs(&nodes, &plan.def.name, source, &plan.def.outputs)?;
        }

        debug!(unit = def.id, bricks = bricks.len(), "unit wired");
        self.units.push(nodes);
        Ok(())
    }

    fn add_outputs(
        &mut self,
        nodes: &UnitNodes,
        owner: &str,
        source: NodeId,
        outputs: &[OutputDef],
    ) -> BuildResult<()> {
        for output in outputs {
            let target = if same_tag(&output.target, OUTLET_TARGET) {
                self.outlet
            } else {
                self.graph
                    .find_node_of_kind(
                        Some(nodes.id),
                        &output.target,
                        NodeKind::Brick {
                            state_bearing: true,
                        },
                    )
                    .or_else(|| {
                        self.graph
                            .find_node_of_kind(Some(nodes.id), &output.target, NodeKind::Splitter)
                    })
                    .ok_or_else(|| BuildError::ConceptionIssue {
                        what: format!("output target '{}' of '{owner}' not found", output.target),
                    })?
            };
            self.graph
                .add_flux(format!("{owner}->{}", output.target), source, target);
        }
        Ok(())
    }

    fn finish(
        self,
        bricks: &[BrickPlan<'_>],
        splitters: &[SplitterPlan<'_>],
    ) -> BuildResult<ModelStructure> {
        let graph = self.graph.build()?;
        let index = IndexMap::from_graph(&graph);

        let mut structure_bricks = Vec::new();
        let mut structure_splitters = Vec::new();
        let mut forcings = Vec::new();
        let mut units = Vec::with_capacity(self.units.len());
        let mut brick_of_node = vec![None; graph.nodes().len()];
        let mut forcing_of_node = vec![None; graph.nodes().len()];
        let mut splitter_of_node = vec![None; graph.nodes().len()];

        for nodes in &self.units {
            let mut unit = HydroUnit {
                id: nodes.id,
                settings_id: nodes.settings_id,
                area: nodes.area,
                bricks: Vec::new(),
                splitters: Vec::new(),
                forcings: Vec::new(),
            };

            for &(kind, node) in &nodes.forcing {
                forcing_of_node[node.slot()] = Some(forcings.len());
                unit.forcings.push(forcings.len());
                forcings.push(Forcing::new(kind, nodes.id, node));
            }

            for (plan, &node) in bricks.iter().zip(&nodes.bricks) {
                let slot = index.require_state_slot(node)?;
                let mut brick = Brick::new(
                    plan.def.name.as_str(),
                    plan.kind,
                    node,
                    slot,
                    plan.parameters.clone(),
                )?;
                for flux in graph.incoming(node) {
                    brick.attach_input(Link::new(flux, index.rate_slot(flux)?));
                }
                for flux in graph.outgoing(node) {
                    brick.attach_output(Link::new(flux, index.rate_slot(flux)?));
                }
                brick.configure_process(plan.process)?;

                brick_of_node[node.slot()] = Some(structure_bricks.len());
                unit.bricks.push(structure_bricks.len());
                structure_bricks.push(brick);
            }

            for (plan, &node) in splitters.iter().zip(&nodes.splitters) {
                let mut splitter =
                    Splitter::new(plan.def.name.as_str(), plan.kind, node, plan.policy.clone());
                for flux in graph.incoming(node) {
                    splitter.attach_input(Link::new(flux, index.rate_slot(flux)?));
                }
                for flux in graph.outgoing(node) {
                    splitter.attach_output(Link::new(flux, index.rate_slot(flux)?));
                }
                splitter_of_node[node.slot()] = Some(structure_splitters.len());
                structure_splitters.push(splitter);
            }

            units.push(unit);
        }

        let fluxes = build_fluxes(
            &graph,
            &index,
            &structure_bricks,
            &brick_of_node,
            &forcing_of_node,
            &splitter_of_node,
        )?;

        let order = splitter_order(&graph, &structure_splitters, &splitter_of_node)?;
        let mut slots: Vec<Option<Splitter>> = structure_splitters.into_iter().map(Some).collect();
        let structure_splitters: Vec<Splitter> =
            order.iter().filter_map(|&i| slots[i].take()).collect();
        for (i, splitter) in structure_splitters.iter().enumerate() {
            let unit = graph
                .node(splitter.node())
                .and_then(|n| n.unit)
                .and_then(|u| units.get_mut(u.slot()));
            if let Some(unit) = unit {
                unit.splitters.push(i);
            }
        }

        Ok(ModelStructure {
            graph,
            index,
            units,
            bricks: structure_bricks,
            splitters: structure_splitters,
            fluxes,
            forcings,
            brick_of_node,
            ctx: EvalContext::new(self.start),
        })
    }
}

fn build_fluxes(
    graph: &Graph,
    index: &IndexMap,
    bricks: &[Brick],
    brick_of_node: &[Option<usize>],
    forcing_of_node: &[Option<usize>],
    splitter_of_node: &[Option<usize>],
) -> BuildResult<Vec<Flux>> {
    let outlet = graph.outlet();
    let mut fluxes = Vec::with_capacity(graph.fluxes().len());
    for edge in graph.fluxes() {
        let (source, target) = graph
            .flux_source(edge.id)
            .zip(graph.flux_target(edge.id))
            .ok_or_else(|| BuildError::ShouldNotHappen {
                what: format!("flux '{}' has lost an end", edge.name),
            })?;
        let slot = index.rate_slot(edge.id)?;

        let mut flux = if let Some(f) = forcing_of_node[source.slot()] {
            let weight = brick_of_node[target.slot()]
                .map(|b| bricks[b].fraction())
                .unwrap_or(1.0);
            Flux::new(edge.id, FluxKind::Forcing, FluxOrigin::Forcing(f), slot).with_weight(weight)
        } else if brick_of_node[source.slot()].is_some() {
            Flux::new(edge.id, FluxKind::Direct, FluxOrigin::Process(source), slot)
        } else if splitter_of_node[source.slot()].is_some() {
            Flux::new(edge.id, FluxKind::Direct, FluxOrigin::Splitter(source), slot)
        } else {
            return Err(BuildError::ShouldNotHappen {
                what: format!("flux '{}' has no known source", edge.name),
            });
        };
        if Some(target) == outlet {
            flux = flux.with_outlet_target();
        }
        fluxes.push(flux);
    }
    Ok(fluxes)
}

/// Order splitters so that a splitter feeding another one comes first.
fn splitter_order(
    graph: &Graph,
    splitters: &[Splitter],
    splitter_of_node: &[Option<usize>],
) -> BuildResult<Vec<usize>> {
    let mut pending: BTreeMap<usize, usize> = BTreeMap::new();
    let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); splitters.len()];
    for (i, splitter) in splitters.iter().enumerate() {
        let upstream = graph
            .incoming(splitter.node())
            .filter_map(|f| graph.flux_source(f))
            .filter_map(|n| splitter_of_node[n.slot()]);
        let mut count = 0;
        for j in upstream {
            downstream[j].push(i);
            count += 1;
        }
        pending.insert(i, count);
    }

    let mut order = Vec::with_capacity(splitters.len());
    while let Some((&ready, _)) = pending.iter().find(|&(_, &count)| count == 0) {
        pending.remove(&ready);
        order.push(ready);
        for &next in &downstream[ready] {
            if let Some(count) = pending.get_mut(&next) {
                *count -= 1;
            }
        }
    }

    if let Some((&stuck, _)) = pending.iter().next() {
        return Err(BuildError::ConceptionIssue {
            what: format!("splitter '{}' is part of a cycle", splitters[stuck].name()),
        });
    }
    Ok(order)
}
