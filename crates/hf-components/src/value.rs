//! Stable value references.
//!
//! Observers (the logger, tests, front ends) never hold addresses into the
//! model. They hold a `ValueRef` and resolve it against the assembled
//! structure whenever they need the current value.

use hf_core::{FluxId, NodeId};

use crate::forcing::VariableKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRef {
    /// Water content of a state-bearing brick.
    Content(NodeId),
    /// Amount carried by a flux during the last completed step.
    FluxAmount(FluxId),
    /// Current value of a forcing on the unit owning `node`.
    Forcing { node: NodeId, kind: VariableKind },
    /// Basin discharge: sum of the amounts of all outlet fluxes.
    OutletDischarge,
}
