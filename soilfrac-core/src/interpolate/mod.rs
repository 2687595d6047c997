//! One-dimensional interpolation of time series values
//!
//! Strategies live in [`strategies`]. Each strategy decides how values between the
//! supplied points are reconstructed and whether targets outside of the supplied
//! time range are clamped to the nearest boundary value or rejected.

use crate::errors::SoilFracResult;
use crate::timeseries::{FloatValue, Time};
use ndarray::ArrayView1;

pub mod strategies;

/// Interpolate a set of points at a target time
///
/// `times` are strictly increasing and have the same length as `values`.
pub trait Interp1DStrategy {
    fn interpolate(
        &self,
        times: ArrayView1<Time>,
        values: ArrayView1<FloatValue>,
        target: Time,
    ) -> SoilFracResult<FloatValue>;
}

/// Index of the last point whose time is less than or equal to `target`
///
/// Returns `None` if `target` lies before the first point.
pub(crate) fn find_segment(times: ArrayView1<Time>, target: Time) -> Option<usize> {
    if times.is_empty() || target < times[0] {
        return None;
    }

    let (mut lo, mut hi) = (0, times.len());
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if times[mid] <= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(lo)
}
