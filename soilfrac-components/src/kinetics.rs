//! First-order decomposition kinetics
//!
//! Litter decomposes with first-order kinetics. A fraction `p` of each decomposed unit is
//! lost from the pool (respired or mineralised), the rest is returned to it, so the effective
//! loss rate is `p * k`. The basal rate `k0` is attenuated with depth.

use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::timeseries::{FloatValue, Time};

/// Amount remaining after decaying for `t` from an initial amount `x0`
///
/// $$ X(t) = X_0 e^{-p k t} $$
///
/// Meaningful for `t >= 0`, `k >= 0` and `0 <= p <= 1`; the ranges are not enforced.
pub fn exponential_decay(x0: FloatValue, k: FloatValue, p: FloatValue, t: Time) -> FloatValue {
    x0 * (-p * k * t).exp()
}

/// Decomposition rate at depth `z`
///
/// $$ k(z) = k_0 e^{-z / z_h} $$
///
/// `zh` must be positive, there is no rate for `zh = 0`.
pub fn depth_decay_rate(z: FloatValue, k0: FloatValue, zh: FloatValue) -> FloatValue {
    k0 * (-z / zh).exp()
}

/// Decomposition rate at depth `z`, halving every `zh`
///
/// $$ k(z) = k_0 2^{-z / z_h} $$
pub fn depth_decay_rate_half_life(z: FloatValue, k0: FloatValue, zh: FloatValue) -> FloatValue {
    k0 * (-z / zh).exp2()
}

/// Apply [`depth_decay_rate`] to every cell of a grid
pub fn decay_rate_profile(grid: &DepthGrid, k0: FloatValue, zh: FloatValue) -> Vec<FloatValue> {
    grid.depths()
        .iter()
        .map(|z| depth_decay_rate(*z, k0, zh))
        .collect()
}
