//! RateModel trait: the contract between the solver family and a model.

use nalgebra::DVector;

use crate::error::StepResult;

/// A coupled-storage system seen through its flux rates.
///
/// The state vector holds one entry per state-bearing brick, the rate vector
/// one entry per flux. A solver only ever asks for:
/// - the rates produced by a trial state: `r = F(S)`
/// - the net change those rates imply for every state slot: `dS = net(r)`
/// - the constrained version of a trial state
///
/// `net` is linear, so combining stage rates with the scheme weights and
/// applying `net` once gives the same state update as combining stage
/// derivatives, while keeping a consistent set of flux rates for the step.
pub trait RateModel {
    fn state_len(&self) -> usize;

    fn rate_len(&self) -> usize;

    /// Evaluate every flux rate for a trial state. Overwrites `rates`.
    fn rates(&self, state: &DVector<f64>, rates: &mut DVector<f64>) -> StepResult<()>;

    /// Net rate of change per state slot (incoming minus outgoing).
    fn net_change(&self, rates: &DVector<f64>, change: &mut DVector<f64>);

    /// Clip a trial state into the physical domain. Rates are left untouched.
    fn apply_constraints(&self, state: &mut DVector<f64>);
}
