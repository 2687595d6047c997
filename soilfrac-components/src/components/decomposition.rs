//! Advection-decomposition soil column
//!
//! Litter enters through the soil surface, is transported downwards at a constant velocity
//! and decomposes with first-order kinetics whose rate decreases with depth.
//!
//! # Governing equation
//!
//! For each tracked pool $X$ (C, N and optionally ¹³C, ¹⁵N):
//!
//! $$ \frac{\partial X}{\partial t} = -\frac{\partial (v X)}{\partial z} - k(z)\, p_X\, \alpha_X\, X $$
//!
//! with a prescribed flux $F_X(t)$ through the surface. The column is discretised into
//! finite volumes with an upwind scheme: the flux through the top face of cell $i$ is the
//! surface flux for $i = 0$ and $v X_{i-1}$ otherwise, and material leaves through the bottom
//! face of the deepest cell.

use log::debug;
use serde::{Deserialize, Serialize};
use soilfrac_core::errors::{SoilFracError, SoilFracResult};
use soilfrac_core::flux::BoundaryFluxes;
use soilfrac_core::ivp::IVP;
use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::state::{ModelState, Pool, PoolSet, StateLayout};
use soilfrac_core::timeseries::{FloatValue, Time};

use crate::parameters::DecompositionParameters;

/// Soil column with downward advection and depth-dependent decomposition
///
/// The bulk-only and isotope-extended variants share this component; the [`PoolSet`] selects
/// which pools are tracked. Tracer pools decay with their element's `p` multiplied by the
/// fractionation factor and are fed by their own boundary flux.
///
/// All fields are fixed at construction, so the right-hand side is a pure function of time
/// and state and the component can be shared between threads. The serialised form holds
/// only the inputs of [`DecompositionColumn::new`] and is validated the same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ColumnSpec", into = "ColumnSpec")]
pub struct DecompositionColumn {
    grid: DepthGrid,
    parameters: DecompositionParameters,
    rates: Vec<FloatValue>,
    layout: StateLayout,
    fluxes: BoundaryFluxes,
}

#[derive(Serialize, Deserialize)]
struct ColumnSpec {
    grid: DepthGrid,
    parameters: DecompositionParameters,
    pool_set: PoolSet,
    fluxes: BoundaryFluxes,
}

impl TryFrom<ColumnSpec> for DecompositionColumn {
    type Error = SoilFracError;

    fn try_from(spec: ColumnSpec) -> Result<Self, Self::Error> {
        Self::new(spec.grid, spec.parameters, spec.pool_set, spec.fluxes)
    }
}

impl From<DecompositionColumn> for ColumnSpec {
    fn from(column: DecompositionColumn) -> Self {
        Self {
            pool_set: column.layout.pool_set(),
            grid: column.grid,
            parameters: column.parameters,
            fluxes: column.fluxes,
        }
    }
}

impl DecompositionColumn {
    /// Create a new column, precomputing the decomposition rate of every cell
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if the parameters are invalid for the grid or
    /// the isotopic pool set is requested without tracer fluxes.
    pub fn new(
        grid: DepthGrid,
        parameters: DecompositionParameters,
        pool_set: PoolSet,
        fluxes: BoundaryFluxes,
    ) -> SoilFracResult<Self> {
        let rates = parameters.rate_profile(&grid)?;
        if !fluxes.supports(pool_set) {
            return Err(SoilFracError::Configuration(format!(
                "boundary fluxes do not cover every pool of the {:?} pool set",
                pool_set
            )));
        }
        let layout = StateLayout::new(pool_set, grid.size());
        debug!(
            "Built {:?} column with {} cells for {}",
            pool_set,
            grid.size(),
            parameters.describe()
        );

        Ok(Self {
            grid,
            parameters,
            rates,
            layout,
            fluxes,
        })
    }

    pub fn grid(&self) -> &DepthGrid {
        &self.grid
    }

    pub fn parameters(&self) -> &DecompositionParameters {
        &self.parameters
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn fluxes(&self) -> &BoundaryFluxes {
        &self.fluxes
    }

    /// Decomposition rate of every cell
    pub fn rates(&self) -> &[FloatValue] {
        &self.rates
    }

    /// Time derivative of the full state
    ///
    /// # Errors
    ///
    /// Fails if the state has the wrong length or a boundary flux cannot be evaluated at `t`.
    pub fn derivative(&self, t: Time, y: &ModelState) -> SoilFracResult<ModelState> {
        self.check_length(y)?;
        let mut dy_dt = self.layout.zeros();
        for pool in self.layout.pool_set().pools() {
            let surface_flux = self.fluxes.for_pool(*pool)?.at_time(t)?;
            self.pool_dy_dt(*pool, surface_flux, y, &mut dy_dt)?;
        }
        Ok(dy_dt)
    }

    /// Flux of each pool leaving through the bottom of the column
    pub fn bottom_outflow(&self, y: &ModelState) -> SoilFracResult<Vec<(Pool, FloatValue)>> {
        self.check_length(y)?;
        self.layout
            .pool_set()
            .pools()
            .iter()
            .map(|pool| {
                let range = self.layout.range(*pool)?;
                Ok((*pool, self.parameters.velocity * y[range.end - 1]))
            })
            .collect()
    }

    fn check_length(&self, y: &ModelState) -> SoilFracResult<()> {
        if y.len() != self.layout.len() {
            return Err(SoilFracError::Configuration(format!(
                "state has {} values, expected {}",
                y.len(),
                self.layout.len()
            )));
        }
        Ok(())
    }

    /// Advection and decay of a single pool
    fn pool_dy_dt(
        &self,
        pool: Pool,
        surface_flux: FloatValue,
        y: &ModelState,
        dy_dt: &mut ModelState,
    ) -> SoilFracResult<()> {
        let range = self.layout.range(pool)?;
        let offset = range.start;
        let v = self.parameters.velocity;
        let dz = self.grid.dz();
        let loss = self.parameters.fraction_lost(pool) * self.parameters.fractionation(pool);

        // Flux through the top face of the current cell
        let mut flux_in = surface_flux;
        for (i, k) in self.rates.iter().enumerate() {
            let x = y[offset + i];
            // Upwind: material leaves a cell in proportion to its own concentration
            let flux_out = v * x;
            dy_dt[offset + i] = -(flux_out - flux_in) / dz - k * loss * x;
            flux_in = flux_out;
        }
        Ok(())
    }
}

impl IVP<Time, ModelState> for DecompositionColumn {
    fn calculate_dy_dt(&self, t: Time, y: &ModelState, dy_dt: &mut ModelState) {
        for pool in self.layout.pool_set().pools() {
            // Spans are checked before integrating, a failure here poisons the state instead
            let surface_flux = self
                .fluxes
                .for_pool(*pool)
                .and_then(|flux| flux.at_time(t))
                .unwrap_or(FloatValue::NAN);
            if self.pool_dy_dt(*pool, surface_flux, y, dy_dt).is_err() {
                dy_dt.fill(FloatValue::NAN);
                return;
            }
        }
    }

    fn check_span(&self, t_start: Time, t_end: Time) -> SoilFracResult<()> {
        self.fluxes
            .check_span(self.layout.pool_set(), t_start, t_end)
    }
}
