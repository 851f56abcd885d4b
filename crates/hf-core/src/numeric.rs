//! Float helpers for water amounts [mm] and rates [mm/d].

use crate::CoreError;

/// How far two water quantities may drift apart and still be the same water.
///
/// `amount` is an absolute slack in mm, `relative` scales with the larger
/// magnitude so that large storages are not held to sub-ulp precision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterTolerance {
    pub amount: f64,
    pub relative: f64,
}

impl WaterTolerance {
    /// Slack allowed around `reference`.
    pub fn slack(self, reference: f64) -> f64 {
        self.amount + self.relative * reference.abs()
    }
}

impl Default for WaterTolerance {
    fn default() -> Self {
        Self {
            amount: 1e-9,
            relative: 1e-12,
        }
    }
}

pub fn same_water(a: f64, b: f64, tol: WaterTolerance) -> bool {
    (a - b).abs() <= tol.slack(a.abs().max(b.abs()))
}

/// True when `value` is above `limit` by more than the tolerance.
pub fn exceeds(value: f64, limit: f64, tol: WaterTolerance) -> bool {
    value - limit > tol.slack(limit)
}

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Case-insensitive comparison of configuration tags ("Direct" == "direct").
pub fn same_tag(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
