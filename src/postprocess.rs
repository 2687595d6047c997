//! Quantities derived from simulation output
//!
//! The carbon to nitrogen ratio and the δ-values of the heavy isotopes are ratios of two
//! pools. Wherever the denominator is zero or negative, for instance in an empty column at
//! the start of a run, the ratio is [`Ratio::Undefined`] rather than a NaN or infinity so
//! that "no data" can be told apart from a genuine value.
//!
//! $$ \delta = \left( \frac{X_{tracer} / X_{bulk}}{R_{standard}} - 1 \right) \times 1000 $$

use crate::output::SimulationOutput;
use log::debug;
use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};
use soilfrac_core::errors::SoilFracResult;
use soilfrac_core::isotopes::{ratio_to_delta, Element};
use soilfrac_core::state::Pool;
use soilfrac_core::timeseries::{FloatValue, Time};

/// Result of dividing two concentrations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Ratio {
    Defined(FloatValue),
    /// The denominator was zero or negative
    Undefined,
}

impl Ratio {
    pub fn value(&self) -> Option<FloatValue> {
        match self {
            Ratio::Defined(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Ratio::Defined(_))
    }
}

/// Divide `numerator` by `denominator`
pub fn ratio(numerator: FloatValue, denominator: FloatValue) -> Ratio {
    if denominator > 0.0 {
        Ratio::Defined(numerator / denominator)
    } else {
        Ratio::Undefined
    }
}

/// A ratio field indexed by `[time, depth]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedField {
    name: String,
    times: Array1<Time>,
    depths: Array1<FloatValue>,
    values: Array2<Ratio>,
}

impl DerivedField {
    fn new(name: String, output: &SimulationOutput, values: Array2<Ratio>) -> Self {
        let field = Self {
            name,
            times: output.times().clone(),
            depths: output.depths().clone(),
            values,
        };
        let undefined = field.undefined_count();
        if undefined > 0 {
            debug!(
                "{}: {} of {} values are undefined",
                field.name,
                undefined,
                field.values.len()
            );
        }
        field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn times(&self) -> &Array1<Time> {
        &self.times
    }

    pub fn depths(&self) -> &Array1<FloatValue> {
        &self.depths
    }

    pub fn values(&self) -> &Array2<Ratio> {
        &self.values
    }

    /// Profile at the last output time, empty if the field has no times
    pub fn final_profile(&self) -> Array1<Ratio> {
        match self.values.nrows().checked_sub(1) {
            Some(last) => self.values.row(last).to_owned(),
            None => Array1::from_vec(Vec::new()),
        }
    }

    pub fn undefined_count(&self) -> usize {
        self.values.iter().filter(|r| !r.is_defined()).count()
    }

    /// Plain values with `fill` in place of undefined ratios
    pub fn to_array_with(&self, fill: FloatValue) -> Array2<FloatValue> {
        self.values.mapv(|r| r.value().unwrap_or(fill))
    }
}

/// Carbon to nitrogen ratio of every cell at every output time
pub fn cn_ratio(output: &SimulationOutput) -> SoilFracResult<DerivedField> {
    let carbon = output.pool(Pool::Carbon)?;
    let nitrogen = output.pool(Pool::Nitrogen)?;
    let values = Zip::from(&carbon)
        .and(&nitrogen)
        .map_collect(|c, n| ratio(*c, *n));

    Ok(DerivedField::new("C/N".to_string(), output, values))
}

/// δ-value (‰) of the heavy isotope of `element`
///
/// # Errors
///
/// Returns [`SoilFracError::MissingPool`](soilfrac_core::errors::SoilFracError::MissingPool)
/// if the run did not track isotopes.
pub fn delta_values(output: &SimulationOutput, element: Element) -> SoilFracResult<DerivedField> {
    let bulk_pool = match element {
        Element::Carbon => Pool::Carbon,
        Element::Nitrogen => Pool::Nitrogen,
    };
    let bulk = output.pool(bulk_pool)?;
    let tracer = output.pool(bulk_pool.tracer())?;
    let standard = element.standard();

    let values = Zip::from(&tracer)
        .and(&bulk)
        .map_collect(|t, b| match ratio(*t, *b) {
            Ratio::Defined(r) => Ratio::Defined(ratio_to_delta(r, standard)),
            Ratio::Undefined => Ratio::Undefined,
        });

    Ok(DerivedField::new(
        format!("δ{}", bulk_pool.tracer()),
        output,
        values,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use soilfrac_core::errors::SoilFracError;
    use soilfrac_core::isotopes::{delta_to_ratio, R_AIR_N2, R_VPDB};
    use soilfrac_core::spatial::DepthGrid;
    use soilfrac_core::state::{ModelState, PoolSet, StateLayout};

    fn output(pool_set: PoolSet, states: Vec<Vec<FloatValue>>) -> SimulationOutput {
        let grid = DepthGrid::new(2, 1.0).unwrap();
        let times: Vec<Time> = (0..states.len()).map(|i| i as Time).collect();
        let states: Vec<ModelState> = states.into_iter().map(ModelState::from_vec).collect();
        SimulationOutput::new(&times, &states, &grid, StateLayout::new(pool_set, 2)).unwrap()
    }

    #[test]
    fn test_ratio_sentinel() {
        assert_eq!(ratio(3.0, 2.0), Ratio::Defined(1.5));
        assert_eq!(ratio(1.0, 0.0), Ratio::Undefined);
        assert_eq!(ratio(1.0, -1e-12), Ratio::Undefined);
        assert_eq!(ratio(0.0, 1.0), Ratio::Defined(0.0));
    }

    #[test]
    fn test_cn_ratio_flags_empty_cells() {
        let out = output(
            PoolSet::Bulk,
            vec![vec![0.0, 0.0, 0.0, 0.0], vec![30.0, 0.0, 1.0, 0.0]],
        );
        let cn = cn_ratio(&out).unwrap();

        assert_eq!(cn.values().shape(), &[2, 2]);
        assert_eq!(cn.undefined_count(), 3);
        assert_eq!(cn.final_profile()[0], Ratio::Defined(30.0));
        assert_eq!(cn.final_profile()[1], Ratio::Undefined);

        let filled = cn.to_array_with(-1.0);
        assert_eq!(filled[[1, 0]], 30.0);
        assert_eq!(filled[[0, 0]], -1.0);
    }

    #[test]
    fn test_final_profile_without_times() {
        let field = DerivedField {
            name: "C/N".to_string(),
            times: Array1::zeros(0),
            depths: Array1::from_vec(vec![0.0, 1.0]),
            values: Array2::from_elem((0, 2), Ratio::Undefined),
        };
        assert!(field.final_profile().is_empty());
        assert_eq!(field.undefined_count(), 0);
    }

    #[test]
    fn test_delta_values() {
        let c13 = 10.0 * delta_to_ratio(-27.0, R_VPDB);
        let n15 = 2.0 * delta_to_ratio(5.0, R_AIR_N2);
        let out = output(
            PoolSet::Isotopic,
            vec![vec![10.0, 0.0, 2.0, 0.0, c13, 0.0, n15, 0.0]],
        );

        let delta_c = delta_values(&out, Element::Carbon).unwrap();
        let delta_n = delta_values(&out, Element::Nitrogen).unwrap();

        assert!(is_close!(delta_c.values()[[0, 0]].value().unwrap(), -27.0));
        assert!(is_close!(delta_n.values()[[0, 0]].value().unwrap(), 5.0));
        assert_eq!(delta_c.values()[[0, 1]], Ratio::Undefined);
        assert_eq!(delta_c.name(), "δ13C");
    }

    #[test]
    fn test_delta_values_require_tracers() {
        let out = output(PoolSet::Bulk, vec![vec![1.0, 1.0, 1.0, 1.0]]);
        assert!(matches!(
            delta_values(&out, Element::Carbon),
            Err(SoilFracError::MissingPool(_))
        ));
    }
}
