//! Assembled model structure: the owner of every brick, flux, splitter and
//! forcing of a run.

use hf_components::{
    Brick, EvalContext, Flux, FluxOrigin, Forcing, Splitter, ValueRef, VariableKind,
};
use hf_core::{NodeId, UnitId, same_tag};
use hf_graph::{Graph, IndexMap};
use nalgebra::DVector;
use tracing::error;

use crate::error::StepResult;
use crate::model::RateModel;

/// Aggregated label resolving to the basin discharge.
pub const OUTLET_LABEL: &str = "outlet";

/// A spatial unit: its own instance of every brick, splitter and forcing.
#[derive(Debug, Clone, PartialEq)]
pub struct HydroUnit {
    pub id: UnitId,
    /// Identifier given in the settings.
    pub settings_id: u32,
    pub area: f64,
    pub(crate) bricks: Vec<usize>,
    pub(crate) splitters: Vec<usize>,
    pub(crate) forcings: Vec<usize>,
}

impl HydroUnit {
    pub fn brick_indices(&self) -> &[usize] {
        &self.bricks
    }

    pub fn splitter_indices(&self) -> &[usize] {
        &self.splitters
    }

    pub fn forcing_indices(&self) -> &[usize] {
        &self.forcings
    }
}

/// Topology is frozen at build time; only values change afterwards.
#[derive(Debug, Clone)]
pub struct ModelStructure {
    pub(crate) graph: Graph,
    pub(crate) index: IndexMap,
    pub(crate) units: Vec<HydroUnit>,
    pub(crate) bricks: Vec<Brick>,
    /// Evaluation order: upstream splitters first.
    pub(crate) splitters: Vec<Splitter>,
    /// Indexed by flux id.
    pub(crate) fluxes: Vec<Flux>,
    pub(crate) forcings: Vec<Forcing>,
    /// Brick index by node slot.
    pub(crate) brick_of_node: Vec<Option<usize>>,
    pub(crate) ctx: EvalContext,
}

impl ModelStructure {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn index(&self) -> &IndexMap {
        &self.index
    }

    pub fn units(&self) -> &[HydroUnit] {
        &self.units
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn splitters(&self) -> &[Splitter] {
        &self.splitters
    }

    pub fn fluxes(&self) -> &[Flux] {
        &self.fluxes
    }

    pub fn forcings(&self) -> &[Forcing] {
        &self.forcings
    }

    /// Number of state-bearing bricks across all units.
    pub fn state_count(&self) -> usize {
        self.index.state_count()
    }

    /// Number of flux connections across all units.
    pub fn rate_count(&self) -> usize {
        self.index.rate_count()
    }

    pub fn context(&self) -> EvalContext {
        self.ctx
    }

    pub fn set_context(&mut self, ctx: EvalContext) {
        self.ctx = ctx;
    }

    pub fn brick_by_node(&self, node: NodeId) -> Option<&Brick> {
        self.brick_of_node
            .get(node.slot())
            .copied()
            .flatten()
            .map(|i| &self.bricks[i])
    }

    /// Brick of a unit (by unit position) by name.
    pub fn unit_brick(&self, unit_index: usize, name: &str) -> Option<&Brick> {
        let unit = self.units.get(unit_index)?;
        unit.bricks
            .iter()
            .map(|&i| &self.bricks[i])
            .find(|b| b.name() == name)
    }

    /// Splitter of a unit (by unit position) by name.
    pub fn unit_splitter(&self, unit_index: usize, name: &str) -> Option<&Splitter> {
        let unit = self.units.get(unit_index)?;
        unit.splitters
            .iter()
            .map(|&i| &self.splitters[i])
            .find(|s| s.name() == name)
    }

    /// Mutable access to a forcing of a unit (by unit position).
    pub fn unit_forcing_mut(
        &mut self,
        unit_index: usize,
        kind: VariableKind,
    ) -> Option<&mut Forcing> {
        let unit = self.units.get(unit_index)?;
        let index = unit
            .forcings
            .iter()
            .copied()
            .find(|&i| self.forcings[i].kind() == kind)?;
        self.forcings.get_mut(index)
    }

    /// Resolve a basin-level log label.
    pub fn aggregated_value_ref(&self, label: &str) -> Option<ValueRef> {
        if same_tag(label, OUTLET_LABEL) || same_tag(label, "discharge") {
            Some(ValueRef::OutletDischarge)
        } else {
            None
        }
    }

    /// Current value behind a reference.
    pub fn value(&self, value: ValueRef) -> Option<f64> {
        match value {
            ValueRef::Content(node) => self.brick_by_node(node).map(Brick::content),
            ValueRef::FluxAmount(flux) => self.fluxes.get(flux.slot()).map(Flux::amount),
            ValueRef::Forcing { node, kind } => self
                .forcings
                .iter()
                .find(|f| f.node() == node && f.kind() == kind)
                .map(Forcing::value),
            ValueRef::OutletDischarge => Some(self.outlet_discharge()),
        }
    }

    /// Sum of the amounts of every flux reaching the outlet.
    pub fn outlet_discharge(&self) -> f64 {
        self.fluxes
            .iter()
            .filter(|f| f.is_outlet())
            .map(Flux::amount)
            .sum()
    }

    /// Contents of every state-bearing brick, by state slot.
    pub fn state_vector(&self) -> DVector<f64> {
        let mut state = DVector::zeros(self.state_count());
        for brick in &self.bricks {
            state[brick.state_slot()] = brick.content();
        }
        state
    }

    /// Restore initial contents and clear every flux and forcing.
    pub fn reset(&mut self) {
        for brick in &mut self.bricks {
            brick.reset();
        }
        for flux in &mut self.fluxes {
            flux.update_flux(0.0);
        }
        for forcing in &mut self.forcings {
            forcing.update(0.0);
        }
    }

    pub fn is_ok(&self) -> bool {
        let mut ok = true;
        for brick in &self.bricks {
            ok &= brick.is_ok();
        }
        for splitter in &self.splitters {
            ok &= splitter.is_ok();
        }
        for (i, forcing) in self.forcings.iter().enumerate() {
            if !forcing.value().is_finite() {
                error!(forcing = i, kind = %forcing.kind(), "non-finite forcing value");
                ok = false;
            } else if forcing.kind().is_water_input() && forcing.value() < 0.0 {
                error!(forcing = i, kind = %forcing.kind(), value = forcing.value(), "negative water input");
                ok = false;
            }
        }
        ok
    }

    /// Final, out-of-solver reconciliation of one (sub-)step.
    ///
    /// Outgoing rates of bricks that would run dry are scaled down, the
    /// splitters redistribute what they receive, incoming rates of bricks
    /// that would overflow are scaled down and the splitters hold back what
    /// their outputs refused. This repeats until nothing changes. `state` is
    /// then recomputed from `start` and the reconciled rates.
    pub fn reconcile(
        &self,
        start: &DVector<f64>,
        rates: &mut DVector<f64>,
        dt: f64,
        state: &mut DVector<f64>,
    ) {
        let r = rates.as_mut_slice();
        let passes = 2 * (self.bricks.len() + self.splitters.len()) + 1;
        for _ in 0..passes {
            let mut changed = false;
            for brick in &self.bricks {
                changed |= brick.limit_outflows(start[brick.state_slot()], r, dt);
            }
            for splitter in &self.splitters {
                splitter.distribute_rates(r);
            }
            for brick in &self.bricks {
                changed |= brick.limit_inflows(start[brick.state_slot()], r, dt);
            }
            for splitter in self.splitters.iter().rev() {
                changed |= splitter.hold_back(r);
            }
            if !changed {
                break;
            }
        }

        for brick in &self.bricks {
            let slot = brick.state_slot();
            let next = start[slot] + dt * brick.net_rate(r);
            state[slot] = brick.apply_constraints(next);
        }
    }

    /// Publish the result of a time step: contents, flux amounts, splitters.
    pub fn commit(&mut self, state: &DVector<f64>, amounts: &DVector<f64>) {
        for brick in &mut self.bricks {
            let content = state[brick.state_slot()];
            brick.set_content(content);
        }
        for flux in &mut self.fluxes {
            flux.update_flux(amounts[flux.rate_slot()]);
        }
        for splitter in &self.splitters {
            splitter.compute(&mut self.fluxes);
        }
    }
}

impl RateModel for ModelStructure {
    fn state_len(&self) -> usize {
        self.state_count()
    }

    fn rate_len(&self) -> usize {
        self.rate_count()
    }

    fn rates(&self, state: &DVector<f64>, rates: &mut DVector<f64>) -> StepResult<()> {
        rates.fill(0.0);
        let r = rates.as_mut_slice();

        for flux in &self.fluxes {
            if let FluxOrigin::Forcing(i) = flux.origin() {
                r[flux.rate_slot()] = self.forcings[i].value() * flux.weight();
            }
        }
        for brick in &self.bricks {
            brick.write_rates(state[brick.state_slot()], &self.ctx, r);
        }
        for splitter in &self.splitters {
            splitter.distribute_rates(r);
        }
        Ok(())
    }

    fn net_change(&self, rates: &DVector<f64>, change: &mut DVector<f64>) {
        for brick in &self.bricks {
            change[brick.state_slot()] = brick.net_rate(rates.as_slice());
        }
    }

    fn apply_constraints(&self, state: &mut DVector<f64>) {
        for brick in &self.bricks {
            let slot = brick.state_slot();
            state[slot] = brick.apply_constraints(state[slot]);
        }
    }
}
