//! Fixed-step explicit solvers.

use std::fmt;

use hf_core::same_tag;
use nalgebra::DVector;

use crate::error::{BuildError, BuildResult, StepResult};
use crate::model::RateModel;

/// Trait for explicit integration schemes.
pub trait Integrator {
    /// Advance `state` by `dt` in place.
    ///
    /// On return `rates` holds the scheme-weighted flux rates, so that
    /// `state = constrain(S + dt * net(rates))`.
    fn step<M: RateModel>(
        &self,
        model: &M,
        state: &mut DVector<f64>,
        dt: f64,
        rates: &mut DVector<f64>,
    ) -> StepResult<()>;
}

/// `out = constrain(base + factor * net(rates))`
fn trial_state<M: RateModel>(
    model: &M,
    base: &DVector<f64>,
    rates: &DVector<f64>,
    factor: f64,
    out: &mut DVector<f64>,
) {
    let mut change = DVector::zeros(base.len());
    model.net_change(rates, &mut change);
    out.copy_from(base);
    out.axpy(factor, &change, 1.0);
    model.apply_constraints(out);
}

fn evaluate<M: RateModel>(model: &M, state: &DVector<f64>) -> StepResult<DVector<f64>> {
    let mut r = DVector::zeros(model.rate_len());
    model.rates(state, &mut r)?;
    Ok(r)
}

/// Explicit Euler (1st order, one evaluation per step).
#[derive(Clone, Copy, Debug, Default)]
pub struct EulerExplicit;

impl Integrator for EulerExplicit {
    fn step<M: RateModel>(
        &self,
        model: &M,
        state: &mut DVector<f64>,
        dt: f64,
        rates: &mut DVector<f64>,
    ) -> StepResult<()> {
        let k1 = evaluate(model, state)?;
        let start = state.clone();
        trial_state(model, &start, &k1, dt, state);
        rates.copy_from(&k1);
        Ok(())
    }
}

/// Heun's method: Euler predictor, trapezoidal corrector.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeunExplicit;

impl Integrator for HeunExplicit {
    fn step<M: RateModel>(
        &self,
        model: &M,
        state: &mut DVector<f64>,
        dt: f64,
        rates: &mut DVector<f64>,
    ) -> StepResult<()> {
        let start = state.clone();
        let mut trial = DVector::zeros(start.len());

        let k1 = evaluate(model, &start)?;
        trial_state(model, &start, &k1, dt, &mut trial);
        let k2 = evaluate(model, &trial)?;

        // r = (k1 + k2) / 2
        rates.copy_from(&k1);
        rates.axpy(0.5, &k2, 0.5);

        trial_state(model, &start, rates, dt, state);
        Ok(())
    }
}

/// Classical 4th-order Runge-Kutta.
#[derive(Clone, Copy, Debug, Default)]
pub struct RungeKutta4;

impl Integrator for RungeKutta4 {
    fn step<M: RateModel>(
        &self,
        model: &M,
        state: &mut DVector<f64>,
        dt: f64,
        rates: &mut DVector<f64>,
    ) -> StepResult<()> {
        let start = state.clone();
        let mut trial = DVector::zeros(start.len());

        let k1 = evaluate(model, &start)?;
        trial_state(model, &start, &k1, 0.5 * dt, &mut trial);
        let k2 = evaluate(model, &trial)?;
        trial_state(model, &start, &k2, 0.5 * dt, &mut trial);
        let k3 = evaluate(model, &trial)?;
        trial_state(model, &start, &k3, dt, &mut trial);
        let k4 = evaluate(model, &trial)?;

        // r = (k1 + 2*k2 + 2*k3 + k4) / 6
        rates.copy_from(&k1);
        rates.axpy(2.0, &k2, 1.0);
        rates.axpy(2.0, &k3, 1.0);
        rates.axpy(1.0, &k4, 1.0);
        *rates /= 6.0;

        trial_state(model, &start, rates, dt, state);
        Ok(())
    }
}

/// Solver selection. Dispatches statically to the scheme structs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SolverKind {
    EulerExplicit,
    HeunExplicit,
    /// 4th-order Runge-Kutta (default).
    #[default]
    RungeKutta4,
}

impl SolverKind {
    pub const ALL: [SolverKind; 3] = [
        SolverKind::EulerExplicit,
        SolverKind::HeunExplicit,
        SolverKind::RungeKutta4,
    ];

    /// Resolve a solver from one of its names (case-insensitive).
    pub fn from_name(name: &str) -> BuildResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.aliases().iter().any(|alias| same_tag(alias, name)))
            .ok_or_else(|| BuildError::InvalidArgument {
                what: format!("unknown solver '{name}'"),
            })
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            SolverKind::EulerExplicit => &["EulerExplicit", "Euler Explicit", "Euler"],
            SolverKind::HeunExplicit => &["HeunExplicit", "Heun Explicit", "Heun"],
            SolverKind::RungeKutta4 => &["RK4", "Runge-Kutta", "RungeKutta"],
        }
    }

    /// Number of rate evaluations per step.
    pub fn stages(self) -> usize {
        match self {
            SolverKind::EulerExplicit => 1,
            SolverKind::HeunExplicit => 2,
            SolverKind::RungeKutta4 => 4,
        }
    }

    pub fn order(self) -> u32 {
        self.stages() as u32
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.aliases()[0])
    }
}

impl Integrator for SolverKind {
    fn step<M: RateModel>(
        &self,
        model: &M,
        state: &mut DVector<f64>,
        dt: f64,
        rates: &mut DVector<f64>,
    ) -> StepResult<()> {
        match self {
            SolverKind::EulerExplicit => EulerExplicit.step(model, state, dt, rates),
            SolverKind::HeunExplicit => HeunExplicit.step(model, state, dt, rates),
            SolverKind::RungeKutta4 => RungeKutta4.step(model, state, dt, rates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single linear reservoir: one state, one flux `k * S` leaving it.
    struct Reservoir {
        k: f64,
    }

    impl RateModel for Reservoir {
        fn state_len(&self) -> usize {
            1
        }

        fn rate_len(&self) -> usize {
            1
        }

        fn rates(&self, state: &DVector<f64>, rates: &mut DVector<f64>) -> StepResult<()> {
            rates[0] = self.k * state[0];
            Ok(())
        }

        fn net_change(&self, rates: &DVector<f64>, change: &mut DVector<f64>) {
            change[0] = -rates[0];
        }

        fn apply_constraints(&self, state: &mut DVector<f64>) {
            state[0] = state[0].max(0.0);
        }
    }

    fn one_step(kind: SolverKind, k: f64, s0: f64, dt: f64) -> (f64, f64) {
        let model = Reservoir { k };
        let mut state = DVector::from_element(1, s0);
        let mut rates = DVector::zeros(1);
        kind.step(&model, &mut state, dt, &mut rates).unwrap();
        (state[0], rates[0])
    }

    #[test]
    fn names_resolve_regardless_of_case() {
        assert_eq!(SolverKind::from_name("rk4").unwrap(), SolverKind::RungeKutta4);
        assert_eq!(
            SolverKind::from_name("runge-kutta").unwrap(),
            SolverKind::RungeKutta4
        );
        assert_eq!(
            SolverKind::from_name("EULER EXPLICIT").unwrap(),
            SolverKind::EulerExplicit
        );
        assert_eq!(
            SolverKind::from_name("heunexplicit").unwrap(),
            SolverKind::HeunExplicit
        );
        assert!(matches!(
            SolverKind::from_name("Crank-Nicolson"),
            Err(BuildError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn euler_matches_hand_computation() {
        let (s, r) = one_step(SolverKind::EulerExplicit, 0.1, 10.0, 1.0);
        assert!((r - 1.0).abs() < 1e-12);
        assert!((s - 9.0).abs() < 1e-12);
    }

    #[test]
    fn heun_matches_hand_computation() {
        // k1 = 1, S* = 9, k2 = 0.9, r = 0.95
        let (s, r) = one_step(SolverKind::HeunExplicit, 0.1, 10.0, 1.0);
        assert!((r - 0.95).abs() < 1e-12);
        assert!((s - 9.05).abs() < 1e-12);
    }

    #[test]
    fn rk4_matches_taylor_expansion() {
        // exact factor of RK4 on y' = -k y: 1 - h + h^2/2 - h^3/6 + h^4/24
        let h: f64 = 0.1;
        let expected = 10.0 * (1.0 - h + h * h / 2.0 - h.powi(3) / 6.0 + h.powi(4) / 24.0);
        let (s, r) = one_step(SolverKind::RungeKutta4, 0.1, 10.0, 1.0);
        assert!((s - expected).abs() < 1e-12);
        assert!((10.0 - r - s).abs() < 1e-12);
    }

    #[test]
    fn trial_states_are_constrained() {
        // k * dt = 3 drives the Euler predictor negative; the corrector must see 0.
        let (_, r) = one_step(SolverKind::HeunExplicit, 3.0, 1.0, 1.0);
        assert!((r - 1.5).abs() < 1e-12);
    }
}
