//! Storage bricks.

use hf_core::{NodeId, WaterTolerance, exceeds, same_tag};
use tracing::error;

use crate::common::{check_finite, sum_slots};
use crate::error::{ComponentError, ComponentResult};
use crate::flux::Link;
use crate::parameter::{EvalContext, ParameterSet, ParameterValue};
use crate::process::{Process, ProcessKind};
use crate::value::ValueRef;

/// Brick variants. Every variant carries water content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrickKind {
    Storage,
    GenericLandCover,
    Urban,
}

impl BrickKind {
    /// Parse a brick type tag (case-insensitive).
    pub fn from_tag(tag: &str) -> ComponentResult<Self> {
        const TABLE: &[(&str, BrickKind)] = &[
            ("storage", BrickKind::Storage),
            ("storagelinear", BrickKind::Storage),
            ("linear_storage", BrickKind::Storage),
            ("genericlandcover", BrickKind::GenericLandCover),
            ("generic_land_cover", BrickKind::GenericLandCover),
            ("ground", BrickKind::GenericLandCover),
            ("urban", BrickKind::Urban),
        ];
        TABLE
            .iter()
            .find(|(alias, _)| same_tag(alias, tag))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ComponentError::unsupported("brick", tag))
    }

    pub fn is_land_cover(self) -> bool {
        matches!(self, BrickKind::GenericLandCover | BrickKind::Urban)
    }

    pub fn is_state_bearing(self) -> bool {
        true
    }
}

/// A storage node: content, attached fluxes and the process draining it.
#[derive(Debug, Clone)]
pub struct Brick {
    name: String,
    kind: BrickKind,
    node: NodeId,
    state_slot: usize,
    parameters: ParameterSet,
    capacity: Option<f64>,
    fraction: f64,
    initial_content: f64,
    content: f64,
    inputs: Vec<Link>,
    outputs: Vec<Link>,
    process: Option<Process>,
}

fn constant_parameter(
    parameters: &ParameterSet,
    owner: &str,
    name: &str,
) -> ComponentResult<Option<f64>> {
    match parameters.get(name) {
        None => Ok(None),
        Some(ParameterValue::Constant(v)) => Ok(Some(*v)),
        Some(_) => Err(ComponentError::NotImplemented {
            what: format!("time-varying '{name}' on brick '{owner}'"),
        }),
    }
}

impl Brick {
    pub fn new(
        name: impl Into<String>,
        kind: BrickKind,
        node: NodeId,
        state_slot: usize,
        parameters: ParameterSet,
    ) -> ComponentResult<Self> {
        let name = name.into();
        let capacity = constant_parameter(&parameters, &name, "capacity")?;
        let initial_content = constant_parameter(&parameters, &name, "initial_content")?.unwrap_or(0.0);
        check_finite(initial_content, "initial_content")?;
        let fraction = if kind.is_land_cover() {
            constant_parameter(&parameters, &name, "fraction")?.unwrap_or(1.0)
        } else {
            1.0
        };

        Ok(Self {
            name,
            kind,
            node,
            state_slot,
            parameters,
            capacity,
            fraction,
            initial_content,
            content: initial_content,
            inputs: Vec::new(),
            outputs: Vec::new(),
            process: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BrickKind {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state_slot(&self) -> usize {
        self.state_slot
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn capacity(&self) -> Option<f64> {
        self.capacity
    }

    /// Area fraction applied to forcing inputs (1 for plain storages).
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn content(&self) -> f64 {
        self.content
    }

    pub fn set_content(&mut self, content: f64) {
        self.content = content;
    }

    /// Restore the configured initial content.
    pub fn reset(&mut self) {
        self.content = self.initial_content;
    }

    pub fn inputs(&self) -> &[Link] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Link] {
        &self.outputs
    }

    pub fn process(&self) -> Option<&Process> {
        self.process.as_ref()
    }

    pub fn attach_input(&mut self, link: Link) {
        self.inputs.push(link);
    }

    pub fn attach_output(&mut self, link: Link) {
        self.outputs.push(link);
    }

    /// Bind the outflow process to the outputs attached so far.
    ///
    /// A brick without outputs owns no process.
    pub fn configure_process(&mut self, kind: ProcessKind) -> ComponentResult<()> {
        self.process = if self.outputs.is_empty() {
            None
        } else {
            Some(Process::new(
                kind,
                &self.name,
                &self.parameters,
                self.outputs.clone(),
            )?)
        };
        Ok(())
    }

    /// Write the process rates for a trial content into the rate vector.
    pub fn write_rates(&self, content: f64, ctx: &EvalContext, rates: &mut [f64]) {
        if let Some(process) = &self.process {
            process.write_rates(content, ctx, rates);
        }
    }

    pub fn inflow_rate(&self, rates: &[f64]) -> f64 {
        sum_slots(rates, self.inputs.iter().map(|l| l.slot))
    }

    pub fn outflow_rate(&self, rates: &[f64]) -> f64 {
        sum_slots(rates, self.outputs.iter().map(|l| l.slot))
    }

    /// Sum of incoming minus sum of outgoing rates.
    pub fn net_rate(&self, rates: &[f64]) -> f64 {
        self.inflow_rate(rates) - self.outflow_rate(rates)
    }

    /// Clip a content into `[0, capacity]`.
    pub fn apply_constraints(&self, content: f64) -> f64 {
        let upper = self.capacity.unwrap_or(f64::INFINITY);
        content.max(0.0).min(upper)
    }

    /// Scale outgoing rates so that `start + dt * net` cannot go below zero.
    ///
    /// Returns true when a rate was changed.
    pub fn limit_outflows(&self, start: f64, rates: &mut [f64], dt: f64) -> bool {
        let outflow = self.outflow_rate(rates);
        if outflow <= 0.0 {
            return false;
        }
        let available = (start.max(0.0) + dt * self.inflow_rate(rates)).max(0.0);
        if dt * outflow <= available {
            return false;
        }
        let factor = available / (dt * outflow);
        for link in &self.outputs {
            rates[link.slot] *= factor;
        }
        true
    }

    /// Scale incoming rates so that `start + dt * net` cannot exceed the
    /// capacity. Water that does not fit stays upstream.
    ///
    /// Returns true when a rate was changed.
    pub fn limit_inflows(&self, start: f64, rates: &mut [f64], dt: f64) -> bool {
        let Some(capacity) = self.capacity else {
            return false;
        };
        let inflow = self.inflow_rate(rates);
        if inflow <= 0.0 {
            return false;
        }
        let room = (capacity - start + dt * self.outflow_rate(rates)).max(0.0);
        if !exceeds(dt * inflow, room, WaterTolerance::default()) {
            return false;
        }
        let factor = room / (dt * inflow);
        for link in &self.inputs {
            rates[link.slot] *= factor;
        }
        true
    }

    pub fn base_value_ref(&self) -> ValueRef {
        ValueRef::Content(self.node)
    }

    /// Resolve a named value on this brick.
    pub fn value_ref(&self, name: &str) -> ComponentResult<ValueRef> {
        let name = name.trim();
        if same_tag(name, "content") || same_tag(name, "storage") {
            return Ok(self.base_value_ref());
        }
        let position = if same_tag(name, "output") || same_tag(name, "outflow") {
            Some(1)
        } else {
            name.to_ascii_lowercase()
                .strip_prefix("output-")
                .and_then(|n| n.parse::<usize>().ok())
        };
        position
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.outputs.get(i))
            .map(|link| ValueRef::FluxAmount(link.flux))
            .ok_or_else(|| ComponentError::ConceptionIssue {
                what: format!("brick '{}' has no value named '{name}'", self.name),
            })
    }

    /// Sanity check of the configured brick.
    pub fn is_ok(&self) -> bool {
        if !self.content.is_finite() || self.content < 0.0 {
            error!(brick = %self.name, content = self.content, "invalid brick content");
            return false;
        }
        if let Some(cap) = self.capacity {
            if cap.is_nan() || cap < 0.0 {
                error!(brick = %self.name, capacity = cap, "negative brick capacity");
                return false;
            }
            if exceeds(self.content, cap, WaterTolerance::default()) {
                error!(brick = %self.name, content = self.content, capacity = cap, "brick content above capacity");
                return false;
            }
        }
        if self.fraction.is_nan() || self.fraction <= 0.0 || self.fraction > 1.0 {
            error!(brick = %self.name, fraction = self.fraction, "land cover fraction outside (0, 1]");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;
    use hf_core::FluxId;

    fn storage(params: Vec<Parameter>) -> Brick {
        Brick::new(
            "slow",
            BrickKind::Storage,
            NodeId::from_index(0),
            0,
            params.into_iter().collect(),
        )
        .unwrap()
    }

    #[test]
    fn kind_tags() {
        assert_eq!(BrickKind::from_tag("STORAGE").unwrap(), BrickKind::Storage);
        assert_eq!(
            BrickKind::from_tag("Generic_Land_Cover").unwrap(),
            BrickKind::GenericLandCover
        );
        assert!(matches!(
            BrickKind::from_tag("Glacier"),
            Err(ComponentError::UnsupportedType { what: "brick", .. })
        ));
    }

    #[test]
    fn constraints_clip_to_domain() {
        let brick = storage(vec![Parameter::constant("capacity", 50.0)]);
        assert_eq!(brick.apply_constraints(-1.0), 0.0);
        assert_eq!(brick.apply_constraints(75.0), 50.0);
        assert_eq!(brick.apply_constraints(20.0), 20.0);
    }

    #[test]
    fn net_rate_is_in_minus_out() {
        let mut brick = storage(vec![]);
        brick.attach_input(Link::new(FluxId::from_index(0), 0));
        brick.attach_output(Link::new(FluxId::from_index(1), 1));
        let rates = [3.0, 1.0];
        assert_eq!(brick.net_rate(&rates), 2.0);
    }

    #[test]
    fn outflows_are_limited_to_available_water() {
        let mut brick = storage(vec![]);
        brick.attach_output(Link::new(FluxId::from_index(0), 0));
        brick.attach_output(Link::new(FluxId::from_index(1), 1));
        let mut rates = [4.0, 4.0];
        assert!(brick.limit_outflows(2.0, &mut rates, 1.0));
        assert!((rates[0] + rates[1] - 2.0).abs() < 1e-12);
        assert!(!brick.limit_outflows(2.0, &mut rates, 1.0));
    }

    #[test]
    fn inflows_are_limited_to_free_capacity() {
        let mut brick = storage(vec![Parameter::constant("capacity", 5.0)]);
        brick.attach_input(Link::new(FluxId::from_index(0), 0));
        brick.attach_output(Link::new(FluxId::from_index(1), 1));
        let mut rates = [10.0, 0.4];
        assert!(brick.limit_inflows(4.0, &mut rates, 1.0));
        assert!((rates[0] - 1.4).abs() < 1e-12);
        assert_eq!(rates[1], 0.4);
        assert!((4.0 + brick.net_rate(&rates) - 5.0).abs() < 1e-12);
        assert!(!brick.limit_inflows(4.0, &mut rates, 1.0));

        let mut open = storage(vec![]);
        open.attach_input(Link::new(FluxId::from_index(0), 0));
        let mut rates = [1e9];
        assert!(!open.limit_inflows(0.0, &mut rates, 1.0));
    }

    #[test]
    fn content_above_capacity_is_not_ok() {
        let brick = storage(vec![
            Parameter::constant("capacity", 5.0),
            Parameter::constant("initial_content", 8.0),
        ]);
        assert!(!brick.is_ok());
    }

    #[test]
    fn value_names() {
        let mut brick = storage(vec![Parameter::constant("response_factor", 0.1)]);
        brick.attach_output(Link::new(FluxId::from_index(4), 4));
        brick.configure_process(ProcessKind::OutflowLinear).unwrap();

        assert_eq!(brick.value_ref("Content").unwrap(), brick.base_value_ref());
        assert_eq!(
            brick.value_ref("output").unwrap(),
            ValueRef::FluxAmount(FluxId::from_index(4))
        );
        assert_eq!(
            brick.value_ref("output-1").unwrap(),
            ValueRef::FluxAmount(FluxId::from_index(4))
        );
        assert!(matches!(
            brick.value_ref("output-2"),
            Err(ComponentError::ConceptionIssue { .. })
        ));
        assert!(brick.value_ref("snow").is_err());
    }

    #[test]
    fn initial_content_and_reset() {
        let mut brick = storage(vec![Parameter::constant("initial_content", 12.0)]);
        assert_eq!(brick.content(), 12.0);
        brick.set_content(3.0);
        brick.reset();
        assert_eq!(brick.content(), 12.0);
        assert!(brick.is_ok());
    }

    #[test]
    fn monthly_capacity_is_not_supported() {
        let params: ParameterSet = [Parameter {
            name: "capacity".into(),
            value: ParameterValue::Monthly([1.0; 12]),
        }]
        .into_iter()
        .collect();
        let err = Brick::new("slow", BrickKind::Storage, NodeId::from_index(0), 0, params)
            .unwrap_err();
        assert!(matches!(err, ComponentError::NotImplemented { .. }));
    }

    #[test]
    fn land_cover_fraction() {
        let brick = Brick::new(
            "ground",
            BrickKind::GenericLandCover,
            NodeId::from_index(0),
            0,
            [Parameter::constant("fraction", 0.4)].into_iter().collect(),
        )
        .unwrap();
        assert_eq!(brick.fraction(), 0.4);
        assert!(brick.is_ok());
    }
}
