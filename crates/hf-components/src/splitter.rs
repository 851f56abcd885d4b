//! Zero-storage splitters.

use hf_core::{NodeId, WaterTolerance, exceeds, same_tag, same_water};
use tracing::error;

use crate::common::sum_slots;
use crate::error::{ComponentError, ComponentResult};
use crate::flux::{Flux, Link};
use crate::value::ValueRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitterKind {
    MultiFluxes,
}

impl SplitterKind {
    pub fn from_tag(tag: &str) -> ComponentResult<Self> {
        if same_tag(tag, "MultiFluxes") || same_tag(tag, "multi_fluxes") {
            Ok(SplitterKind::MultiFluxes)
        } else {
            Err(ComponentError::unsupported("splitter", tag))
        }
    }
}

/// How the incoming total is handed to the outputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SplitPolicy {
    /// Every output receives the full incoming total.
    #[default]
    Broadcast,
    /// Output `i` receives `fractions[i]` of the incoming total.
    Proportional(Vec<f64>),
}

impl SplitPolicy {
    fn share(&self, total: f64, output: usize) -> f64 {
        match self {
            SplitPolicy::Broadcast => total,
            SplitPolicy::Proportional(fractions) => {
                total * fractions.get(output).copied().unwrap_or(0.0)
            }
        }
    }

    /// Largest incoming total for which `output` receives at most `accepted`.
    fn passable(&self, accepted: f64, output: usize) -> f64 {
        match self {
            SplitPolicy::Broadcast => accepted,
            SplitPolicy::Proportional(fractions) => match fractions.get(output) {
                Some(&f) if f > 0.0 => accepted / f,
                _ => f64::INFINITY,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    name: String,
    kind: SplitterKind,
    node: NodeId,
    policy: SplitPolicy,
    inputs: Vec<Link>,
    outputs: Vec<Link>,
}

impl Splitter {
    pub fn new(name: impl Into<String>, kind: SplitterKind, node: NodeId, policy: SplitPolicy) -> Self {
        Self {
            name: name.into(),
            kind,
            node,
            policy,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SplitterKind {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn policy(&self) -> &SplitPolicy {
        &self.policy
    }

    pub fn inputs(&self) -> &[Link] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Link] {
        &self.outputs
    }

    pub fn attach_input(&mut self, link: Link) {
        self.inputs.push(link);
    }

    pub fn attach_output(&mut self, link: Link) {
        self.outputs.push(link);
    }

    /// Structural check. Never fails hard; the caller decides what to do.
    pub fn is_ok(&self) -> bool {
        if self.outputs.len() < 2 {
            error!(splitter = %self.name, outputs = self.outputs.len(), "splitter needs at least 2 outputs");
            return false;
        }
        if self.inputs.is_empty() {
            error!(splitter = %self.name, "splitter has no input");
            return false;
        }
        if let SplitPolicy::Proportional(fractions) = &self.policy {
            if fractions.len() != self.outputs.len() {
                error!(
                    splitter = %self.name,
                    fractions = fractions.len(),
                    outputs = self.outputs.len(),
                    "one fraction per output expected"
                );
                return false;
            }
            let sum: f64 = fractions.iter().sum();
            if !same_water(sum, 1.0, WaterTolerance::default()) {
                error!(splitter = %self.name, sum, "fractions must add up to 1");
                return false;
            }
        }
        true
    }

    /// Redistribute the incoming rates into the outgoing rate slots.
    pub fn distribute_rates(&self, rates: &mut [f64]) {
        let total = sum_slots(rates, self.inputs.iter().map(|l| l.slot));
        for (i, link) in self.outputs.iter().enumerate() {
            rates[link.slot] = self.policy.share(total, i);
        }
    }

    /// Cut the incoming rates down to what the outputs accepted.
    ///
    /// Outputs reduced downstream bound the total the policy can pass on.
    /// Inputs are scaled to that total and every output is reset to its
    /// share of it. Returns true when a rate was changed.
    pub fn hold_back(&self, rates: &mut [f64]) -> bool {
        let total = sum_slots(rates, self.inputs.iter().map(|l| l.slot));
        if total <= 0.0 {
            return false;
        }
        let passable = self
            .outputs
            .iter()
            .enumerate()
            .map(|(i, link)| self.policy.passable(rates[link.slot], i))
            .fold(f64::INFINITY, f64::min);
        if !exceeds(total, passable, WaterTolerance::default()) {
            return false;
        }
        let kept = passable.max(0.0);
        let factor = kept / total;
        for link in &self.inputs {
            rates[link.slot] *= factor;
        }
        for (i, link) in self.outputs.iter().enumerate() {
            rates[link.slot] = self.policy.share(kept, i);
        }
        true
    }

    /// Copy the finalized incoming amounts to the outputs.
    ///
    /// `fluxes` is indexed by flux id.
    pub fn compute(&self, fluxes: &mut [Flux]) {
        let total: f64 = self
            .inputs
            .iter()
            .filter_map(|l| fluxes.get(l.flux.slot()))
            .map(Flux::amount)
            .sum();
        for (i, link) in self.outputs.iter().enumerate() {
            if let Some(flux) = fluxes.get_mut(link.flux.slot()) {
                flux.update_flux(self.policy.share(total, i));
            }
        }
    }

    /// Resolve `output-N` (or `output` for the first one).
    pub fn value_ref(&self, name: &str) -> ComponentResult<ValueRef> {
        let lower = name.trim().to_ascii_lowercase();
        let position = if lower == "output" {
            Some(1)
        } else {
            lower.strip_prefix("output-").and_then(|n| n.parse::<usize>().ok())
        };
        position
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.outputs.get(i))
            .map(|link| ValueRef::FluxAmount(link.flux))
            .ok_or_else(|| ComponentError::ConceptionIssue {
                what: format!("splitter '{}' has no value named '{name}'", self.name),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux::{FluxKind, FluxOrigin};
    use hf_core::FluxId;

    fn fluxes(n: u32, splitter: NodeId) -> Vec<Flux> {
        (0..n)
            .map(|i| {
                Flux::new(
                    FluxId::from_index(i),
                    FluxKind::Direct,
                    FluxOrigin::Splitter(splitter),
                    i as usize,
                )
            })
            .collect()
    }

    fn splitter(outputs: u32, policy: SplitPolicy) -> Splitter {
        let mut s = Splitter::new("split", SplitterKind::MultiFluxes, NodeId::from_index(1), policy);
        s.attach_input(Link::new(FluxId::from_index(0), 0));
        for i in 1..=outputs {
            s.attach_output(Link::new(FluxId::from_index(i), i as usize));
        }
        s
    }

    #[test]
    fn broadcast_copies_input_to_every_output() {
        let s = splitter(2, SplitPolicy::Broadcast);
        assert!(s.is_ok());
        let mut all = fluxes(3, s.node());
        all[0].update_flux(7.0);
        s.compute(&mut all);
        assert_eq!(all[1].amount(), 7.0);
        assert_eq!(all[2].amount(), 7.0);
    }

    #[test]
    fn single_output_is_not_ok() {
        assert!(!splitter(1, SplitPolicy::Broadcast).is_ok());
    }

    #[test]
    fn no_input_is_not_ok() {
        let mut s = Splitter::new("split", SplitterKind::MultiFluxes, NodeId::from_index(1), SplitPolicy::Broadcast);
        s.attach_output(Link::new(FluxId::from_index(0), 0));
        s.attach_output(Link::new(FluxId::from_index(1), 1));
        assert!(!s.is_ok());
    }

    #[test]
    fn proportional_rates() {
        let s = splitter(2, SplitPolicy::Proportional(vec![0.25, 0.75]));
        assert!(s.is_ok());
        let mut rates = [8.0, 0.0, 0.0];
        s.distribute_rates(&mut rates);
        assert_eq!(rates, [8.0, 2.0, 6.0]);
        assert!(!splitter(3, SplitPolicy::Proportional(vec![0.5, 0.5])).is_ok());
        assert!(!splitter(2, SplitPolicy::Proportional(vec![0.5, 0.6])).is_ok());
    }

    #[test]
    fn hold_back_follows_the_most_limited_output() {
        let s = splitter(2, SplitPolicy::Proportional(vec![0.25, 0.75]));
        // output 2 only took 3 of its 6
        let mut rates = [8.0, 2.0, 3.0];
        assert!(s.hold_back(&mut rates));
        assert_eq!(rates, [4.0, 1.0, 3.0]);
        assert!(!s.hold_back(&mut rates));

        let b = splitter(2, SplitPolicy::Broadcast);
        let mut rates = [8.0, 8.0, 5.0];
        assert!(b.hold_back(&mut rates));
        assert_eq!(rates, [5.0, 5.0, 5.0]);
    }

    #[test]
    fn outputs_are_not_capped() {
        let s = splitter(7, SplitPolicy::Broadcast);
        assert_eq!(
            s.value_ref("output-7").unwrap(),
            ValueRef::FluxAmount(FluxId::from_index(7))
        );
        assert_eq!(
            s.value_ref("Output").unwrap(),
            ValueRef::FluxAmount(FluxId::from_index(1))
        );
        assert!(s.value_ref("output-8").is_err());
        assert!(s.value_ref("output-0").is_err());
    }

    #[test]
    fn unknown_kind() {
        assert!(SplitterKind::from_tag("multifluxes").is_ok());
        assert!(matches!(
            SplitterKind::from_tag("Cascade"),
            Err(ComponentError::UnsupportedType { what: "splitter", .. })
        ));
    }
}
