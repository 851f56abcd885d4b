//! Common utilities for component calculations.

use crate::error::{ComponentError, ComponentResult};
use hf_core::numeric::ensure_finite;

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<()> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })?;
    Ok(())
}

/// Share `total` equally among `n` receivers (0 when there is no receiver).
#[inline]
pub fn even_share(total: f64, n: usize) -> f64 {
    if n == 0 { 0.0 } else { total / n as f64 }
}

/// Sum the entries of `values` addressed by `slots`.
#[inline]
pub fn sum_slots(values: &[f64], slots: impl IntoIterator<Item = usize>) -> f64 {
    slots.into_iter().map(|s| values[s]).sum()
}
