//! Interpolation strategies
//!
//! Two strategies are provided:
//!
//! - [`LinearSplineStrategy`]: piecewise-linear between points
//! - [`PreviousStrategy`]: holds the value of the most recent point (step function)
//!
//! Both take an `extrapolate` flag. When `true`, targets outside of the supplied time range
//! evaluate to the nearest boundary value (boundary clamping). When `false` they return
//! [`SoilFracError::ExtrapolationNotAllowed`].

use super::{find_segment, Interp1DStrategy};
use crate::errors::{SoilFracError, SoilFracResult};
use crate::timeseries::{FloatValue, Time};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

fn out_of_range(times: &ArrayView1<Time>, target: Time) -> SoilFracError {
    SoilFracError::ExtrapolationNotAllowed {
        target,
        min: times[0],
        max: times[times.len() - 1],
    }
}

/// Piecewise-linear interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearSplineStrategy {
    extrapolate: bool,
}

impl LinearSplineStrategy {
    pub fn new(extrapolate: bool) -> Self {
        Self { extrapolate }
    }
}

impl Interp1DStrategy for LinearSplineStrategy {
    fn interpolate(
        &self,
        times: ArrayView1<Time>,
        values: ArrayView1<FloatValue>,
        target: Time,
    ) -> SoilFracResult<FloatValue> {
        let last = times.len() - 1;

        if target < times[0] || target > times[last] {
            if !self.extrapolate {
                return Err(out_of_range(&times, target));
            }
            return Ok(if target < times[0] {
                values[0]
            } else {
                values[last]
            });
        }

        let i = find_segment(times, target).ok_or_else(|| out_of_range(&times, target))?;
        if i == last {
            return Ok(values[last]);
        }

        let frac = (target - times[i]) / (times[i + 1] - times[i]);
        Ok(values[i] + frac * (values[i + 1] - values[i]))
    }
}

/// Step interpolation using the value of the most recent point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousStrategy {
    extrapolate: bool,
}

impl PreviousStrategy {
    pub fn new(extrapolate: bool) -> Self {
        Self { extrapolate }
    }
}

impl Interp1DStrategy for PreviousStrategy {
    fn interpolate(
        &self,
        times: ArrayView1<Time>,
        values: ArrayView1<FloatValue>,
        target: Time,
    ) -> SoilFracResult<FloatValue> {
        let last = times.len() - 1;

        if !self.extrapolate && (target < times[0] || target > times[last]) {
            return Err(out_of_range(&times, target));
        }

        match find_segment(times, target) {
            Some(i) => Ok(values[i]),
            None => Ok(values[0]),
        }
    }
}

/// The set of available interpolation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationStrategy {
    Linear(LinearSplineStrategy),
    Previous(PreviousStrategy),
}

impl Default for InterpolationStrategy {
    fn default() -> Self {
        Self::Linear(LinearSplineStrategy::new(true))
    }
}

impl From<LinearSplineStrategy> for InterpolationStrategy {
    fn from(value: LinearSplineStrategy) -> Self {
        Self::Linear(value)
    }
}

impl From<PreviousStrategy> for InterpolationStrategy {
    fn from(value: PreviousStrategy) -> Self {
        Self::Previous(value)
    }
}

impl Interp1DStrategy for InterpolationStrategy {
    fn interpolate(
        &self,
        times: ArrayView1<Time>,
        values: ArrayView1<FloatValue>,
        target: Time,
    ) -> SoilFracResult<FloatValue> {
        match self {
            InterpolationStrategy::Linear(s) => s.interpolate(times, values, target),
            InterpolationStrategy::Previous(s) => s.interpolate(times, values, target),
        }
    }
}
