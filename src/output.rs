//! Simulation output
//!
//! A [`SimulationOutput`] holds the state of one run at every output time. Rows are output
//! times and columns are entries of the flattened state vector. Per-pool views are
//! two-dimensional arrays indexed by `[time, depth]`, alongside the time grid and the depth
//! grid, which is the shape handed to plotting collaborators.

use ndarray::{s, Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use soilfrac_core::errors::{SoilFracError, SoilFracResult};
use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::state::{ModelState, Pool, StateLayout};
use soilfrac_core::timeseries::{FloatValue, Time};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OutputData")]
pub struct SimulationOutput {
    times: Array1<Time>,
    depths: Array1<FloatValue>,
    dz: FloatValue,
    layout: StateLayout,
    values: Array2<FloatValue>,
}

/// Serialised form, checked before it becomes a [`SimulationOutput`]
#[derive(Deserialize)]
struct OutputData {
    times: Array1<Time>,
    depths: Array1<FloatValue>,
    dz: FloatValue,
    layout: StateLayout,
    values: Array2<FloatValue>,
}

impl TryFrom<OutputData> for SimulationOutput {
    type Error = SoilFracError;

    fn try_from(data: OutputData) -> Result<Self, Self::Error> {
        if data.times.is_empty() {
            return Err(no_output_times());
        }
        if data.values.dim() != (data.times.len(), data.layout.len())
            || data.depths.len() != data.layout.n_cells()
        {
            return Err(SoilFracError::Configuration(format!(
                "values of shape {:?} do not match {} times and a layout of {} values over {} depths",
                data.values.dim(),
                data.times.len(),
                data.layout.len(),
                data.depths.len()
            )));
        }
        Ok(Self {
            times: data.times,
            depths: data.depths,
            dz: data.dz,
            layout: data.layout,
            values: data.values,
        })
    }
}

fn no_output_times() -> SoilFracError {
    SoilFracError::Configuration("output has no time steps".to_string())
}

impl SimulationOutput {
    /// Collect the states of a run
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if there are no times, the number of states
    /// does not match the number of times or a state does not match the layout.
    pub fn new(
        times: &[Time],
        states: &[ModelState],
        grid: &DepthGrid,
        layout: StateLayout,
    ) -> SoilFracResult<Self> {
        if times.is_empty() {
            return Err(no_output_times());
        }
        if times.len() != states.len() {
            return Err(SoilFracError::Configuration(format!(
                "{} output times but {} states",
                times.len(),
                states.len()
            )));
        }
        if layout.n_cells() != grid.size() {
            return Err(SoilFracError::Configuration(format!(
                "layout has {} cells but the grid has {}",
                layout.n_cells(),
                grid.size()
            )));
        }

        let mut values = Array2::zeros((times.len(), layout.len()));
        for (mut row, state) in values.rows_mut().into_iter().zip(states) {
            if state.len() != layout.len() {
                return Err(SoilFracError::Configuration(format!(
                    "state has {} values, expected {}",
                    state.len(),
                    layout.len()
                )));
            }
            row.iter_mut()
                .zip(state.iter())
                .for_each(|(dst, src)| *dst = *src);
        }

        Ok(Self {
            times: Array1::from_vec(times.to_vec()),
            depths: grid.depths(),
            dz: grid.dz(),
            layout,
            values,
        })
    }

    pub fn times(&self) -> &Array1<Time> {
        &self.times
    }

    pub fn depths(&self) -> &Array1<FloatValue> {
        &self.depths
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Raw values indexed by `[time, state index]`
    pub fn values(&self) -> &Array2<FloatValue> {
        &self.values
    }

    /// Number of output times
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Concentrations of a pool indexed by `[time, depth]`
    pub fn pool(&self, pool: Pool) -> SoilFracResult<Array2<FloatValue>> {
        let range = self.layout.range(pool)?;
        Ok(self.values.slice(s![.., range]).to_owned())
    }

    /// Profile of a pool at the last output time
    pub fn final_profile(&self, pool: Pool) -> SoilFracResult<Array1<FloatValue>> {
        let range = self.layout.range(pool)?;
        let last = self.len().checked_sub(1).ok_or_else(no_output_times)?;
        Ok(self.values.slice(s![last, range]).to_owned())
    }

    /// Full state at an output time
    pub fn state_at(&self, index: usize) -> Option<ArrayView1<'_, FloatValue>> {
        (index < self.len()).then(|| self.values.row(index))
    }

    /// Amount of a pool in the whole column at every output time
    pub fn column_totals(&self, pool: Pool) -> SoilFracResult<Array1<FloatValue>> {
        let range = self.layout.range(pool)?;
        Ok(self
            .values
            .slice(s![.., range])
            .rows()
            .into_iter()
            .map(|row| row.sum() * self.dz)
            .collect())
    }

    /// Whether any concentration is below `-tolerance`
    pub fn has_negative_concentrations(&self, tolerance: FloatValue) -> bool {
        self.values.iter().any(|v| *v < -tolerance)
    }
}
