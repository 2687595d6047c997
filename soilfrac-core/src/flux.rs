//! Surface boundary fluxes
//!
//! Litter input enters the column through its top face. Each tracked pool has its own
//! [`BoundaryFlux`], a value type that can be evaluated at any time. Fluxes of the heavy
//! isotopes are derived from the bulk flux and the isotopic composition (δ-value) of the
//! source material:
//!
//! $$ F_{^{13}C}(t) = F_C(t) \times R(\delta^{13}C_{source}(t)) $$
//!
//! where $R$ converts a δ-value to an isotope ratio (see [`delta_to_ratio`]).

use crate::errors::{SoilFracError, SoilFracResult};
use crate::isotopes::{delta_to_ratio, Element};
use crate::state::{Pool, PoolSet};
use crate::timeseries::{FloatValue, Time, Timeseries};
use serde::{Deserialize, Serialize};

/// Flux of material through the top of the column as a function of time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundaryFlux {
    /// Time-invariant flux
    Constant(FloatValue),
    /// Flux interpolated from a series of values
    Series(Timeseries),
    /// Heavy-isotope flux derived from a bulk flux and the δ-value of the source
    Tracer {
        bulk: Box<BoundaryFlux>,
        delta: Box<BoundaryFlux>,
        standard: FloatValue,
    },
}

impl BoundaryFlux {
    pub fn constant(value: FloatValue) -> Self {
        Self::Constant(value)
    }

    pub fn from_series(series: Timeseries) -> Self {
        Self::Series(series)
    }

    /// Tracer flux of `bulk` material with isotopic composition `delta` (‰)
    pub fn tracer(bulk: BoundaryFlux, delta: BoundaryFlux, standard: FloatValue) -> Self {
        Self::Tracer {
            bulk: Box::new(bulk),
            delta: Box::new(delta),
            standard,
        }
    }

    /// Evaluate the flux at time `t`
    ///
    /// Series fluxes follow the interpolation strategy of their timeseries, so this only
    /// fails if that strategy forbids extrapolation and `t` lies outside the series.
    pub fn at_time(&self, t: Time) -> SoilFracResult<FloatValue> {
        match self {
            BoundaryFlux::Constant(value) => Ok(*value),
            BoundaryFlux::Series(series) => series.at_time(t),
            BoundaryFlux::Tracer {
                bulk,
                delta,
                standard,
            } => Ok(bulk.at_time(t)? * delta_to_ratio(delta.at_time(t)?, *standard)),
        }
    }

    /// Check that the flux can be evaluated over `[t_start, t_end]`
    pub fn check_span(&self, t_start: Time, t_end: Time) -> SoilFracResult<()> {
        self.at_time(t_start)?;
        self.at_time(t_end)?;
        Ok(())
    }
}

/// Boundary fluxes for every pool of a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFluxes {
    pub carbon: BoundaryFlux,
    pub nitrogen: BoundaryFlux,
    pub carbon13: Option<BoundaryFlux>,
    pub nitrogen15: Option<BoundaryFlux>,
}

impl BoundaryFluxes {
    /// Fluxes for a bulk-only simulation
    pub fn bulk(carbon: BoundaryFlux, nitrogen: BoundaryFlux) -> Self {
        Self {
            carbon,
            nitrogen,
            carbon13: None,
            nitrogen15: None,
        }
    }

    pub fn with_tracers(self, carbon13: BoundaryFlux, nitrogen15: BoundaryFlux) -> Self {
        Self {
            carbon13: Some(carbon13),
            nitrogen15: Some(nitrogen15),
            ..self
        }
    }

    /// Derive tracer fluxes from the δ-values of the source material
    ///
    /// `delta_carbon` and `delta_nitrogen` are in ‰ relative to VPDB and atmospheric N₂.
    pub fn from_deltas(
        carbon: BoundaryFlux,
        nitrogen: BoundaryFlux,
        delta_carbon: BoundaryFlux,
        delta_nitrogen: BoundaryFlux,
    ) -> Self {
        let carbon13 = BoundaryFlux::tracer(
            carbon.clone(),
            delta_carbon,
            Element::Carbon.standard(),
        );
        let nitrogen15 = BoundaryFlux::tracer(
            nitrogen.clone(),
            delta_nitrogen,
            Element::Nitrogen.standard(),
        );
        Self::bulk(carbon, nitrogen).with_tracers(carbon13, nitrogen15)
    }

    /// The flux entering a given pool
    pub fn for_pool(&self, pool: Pool) -> SoilFracResult<&BoundaryFlux> {
        let flux = match pool {
            Pool::Carbon => Some(&self.carbon),
            Pool::Nitrogen => Some(&self.nitrogen),
            Pool::Carbon13 => self.carbon13.as_ref(),
            Pool::Nitrogen15 => self.nitrogen15.as_ref(),
        };
        flux.ok_or_else(|| SoilFracError::MissingPool(pool.to_string()))
    }

    /// Whether a flux is available for every pool in `pool_set`
    pub fn supports(&self, pool_set: PoolSet) -> bool {
        pool_set
            .pools()
            .iter()
            .all(|pool| self.for_pool(*pool).is_ok())
    }

    /// Check that every flux used by `pool_set` can be evaluated over `[t_start, t_end]`
    pub fn check_span(&self, pool_set: PoolSet, t_start: Time, t_end: Time) -> SoilFracResult<()> {
        for pool in pool_set.pools() {
            self.for_pool(*pool)?.check_span(t_start, t_end)?;
        }
        Ok(())
    }
}
