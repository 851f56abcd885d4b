//! Fluxes: directed, valued edges between nodes.

use hf_core::{FluxId, NodeId, same_tag};

use crate::error::{ComponentError, ComponentResult};
use crate::value::ValueRef;

/// Configured flux type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FluxKind {
    /// Pass-through of the amount computed upstream.
    Direct,
    /// Value copied from a forcing each step.
    Forcing,
}

impl FluxKind {
    /// Parse an output flux type. Only `Direct` can be declared in settings.
    pub fn from_tag(tag: &str) -> ComponentResult<Self> {
        if same_tag(tag, "Direct") {
            Ok(FluxKind::Direct)
        } else {
            Err(ComponentError::unsupported("flux", tag))
        }
    }
}

/// Where the rate of a flux comes from during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluxOrigin {
    /// Copied from the forcing at `index` in the structure's forcing table.
    Forcing(usize),
    /// Written by the process of the brick at `node`.
    Process(NodeId),
    /// Redistributed by the splitter at `node`.
    Splitter(NodeId),
}

/// Attachment of a flux to a node: the flux id and its rate slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub flux: FluxId,
    pub slot: usize,
}

impl Link {
    pub fn new(flux: FluxId, slot: usize) -> Self {
        Self { flux, slot }
    }
}

/// A flux owns its last amount and knows its slot in the change-rate vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Flux {
    id: FluxId,
    kind: FluxKind,
    origin: FluxOrigin,
    rate_slot: usize,
    /// Multiplier applied to forcing values (area fraction of the target).
    weight: f64,
    to_outlet: bool,
    amount: f64,
}

impl Flux {
    pub fn new(id: FluxId, kind: FluxKind, origin: FluxOrigin, rate_slot: usize) -> Self {
        Self {
            id,
            kind,
            origin,
            rate_slot,
            weight: 1.0,
            to_outlet: false,
            amount: 0.0,
        }
    }

    /// Mark the flux as discharging to the basin outlet.
    pub fn with_outlet_target(mut self) -> Self {
        self.to_outlet = true;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn id(&self) -> FluxId {
        self.id
    }

    pub fn kind(&self) -> FluxKind {
        self.kind
    }

    pub fn origin(&self) -> FluxOrigin {
        self.origin
    }

    pub fn is_forcing(&self) -> bool {
        self.kind == FluxKind::Forcing
    }

    pub fn is_outlet(&self) -> bool {
        self.to_outlet
    }

    /// Slot of this flux in the change-rate vector.
    pub fn rate_slot(&self) -> usize {
        self.rate_slot
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Amount carried during the last completed step.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn update_flux(&mut self, amount: f64) {
        self.amount = amount;
    }

    pub fn link(&self) -> Link {
        Link::new(self.id, self.rate_slot)
    }

    pub fn amount_ref(&self) -> ValueRef {
        ValueRef::FluxAmount(self.id)
    }
}
