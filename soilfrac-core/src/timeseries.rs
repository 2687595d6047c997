//! Time series of externally supplied values
//!
//! A [`Timeseries`] holds a sorted, duplicate-free sequence of `(time, value)` pairs
//! together with the [`InterpolationStrategy`] used to evaluate it between (and beyond)
//! the supplied points. Boundary inputs such as litter fluxes or source δ-values are
//! built from these.

use crate::errors::{SoilFracError, SoilFracResult};
use crate::interpolate::strategies::{InterpolationStrategy, LinearSplineStrategy};
use crate::interpolate::Interp1DStrategy;
use ndarray::{array, Array1};
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
pub type Time = f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    times: Array1<Time>,
    values: Array1<FloatValue>,
    interpolation_strategy: InterpolationStrategy,
}

impl Timeseries {
    /// Create a new timeseries
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::InvalidTimeseries`] if the series is empty, the lengths of
    /// `times` and `values` differ, any time is not finite, or the times are not
    /// strictly increasing (unsorted or duplicated).
    pub fn new(
        times: Array1<Time>,
        values: Array1<FloatValue>,
        interpolation_strategy: InterpolationStrategy,
    ) -> SoilFracResult<Self> {
        if times.is_empty() {
            return Err(SoilFracError::InvalidTimeseries(
                "at least one point is required".to_string(),
            ));
        }
        if times.len() != values.len() {
            return Err(SoilFracError::InvalidTimeseries(format!(
                "{} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return Err(SoilFracError::InvalidTimeseries(format!(
                "time {} is not finite",
                t
            )));
        }
        if let Some(i) = (1..times.len()).find(|&i| times[i] <= times[i - 1]) {
            return Err(SoilFracError::InvalidTimeseries(format!(
                "times must be strictly increasing, found {} after {}",
                times[i],
                times[i - 1]
            )));
        }

        Ok(Self {
            times,
            values,
            interpolation_strategy,
        })
    }

    /// Create a linearly interpolated timeseries which clamps outside of its time range
    pub fn from_values(values: Array1<FloatValue>, times: Array1<Time>) -> SoilFracResult<Self> {
        Self::new(
            times,
            values,
            InterpolationStrategy::from(LinearSplineStrategy::new(true)),
        )
    }

    /// Create a linearly interpolated timeseries from `(time, value)` pairs
    pub fn from_pairs(pairs: &[(Time, FloatValue)]) -> SoilFracResult<Self> {
        let times = pairs.iter().map(|(t, _)| *t).collect::<Array1<_>>();
        let values = pairs.iter().map(|(_, v)| *v).collect::<Array1<_>>();
        Self::from_values(values, times)
    }

    /// A timeseries with a single point, which evaluates to `value` everywhere
    pub fn constant(value: FloatValue) -> Self {
        Self {
            times: array![0.0],
            values: array![value],
            interpolation_strategy: InterpolationStrategy::from(LinearSplineStrategy::new(true)),
        }
    }

    pub fn with_interpolation_strategy(self, interpolation_strategy: InterpolationStrategy) -> Self {
        Self {
            interpolation_strategy,
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false, a timeseries holds at least one point
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &Array1<Time> {
        &self.times
    }

    pub fn values(&self) -> &Array1<FloatValue> {
        &self.values
    }

    pub fn interpolation_strategy(&self) -> &InterpolationStrategy {
        &self.interpolation_strategy
    }

    /// First and last time of the series
    pub fn time_range(&self) -> (Time, Time) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// Evaluate the timeseries at an arbitrary time
    pub fn at_time(&self, time: Time) -> SoilFracResult<FloatValue> {
        self.interpolation_strategy
            .interpolate(self.times.view(), self.values.view(), time)
    }
}
