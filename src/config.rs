//! TOML configuration of simulations and sweeps
//!
//! ```toml
//! pools = "isotopic"
//!
//! [grid]
//! n_cells = 100
//! dz = 1.0
//!
//! [fluxes]
//! carbon = { constant = 100.0 }
//! nitrogen = { constant = 3.3333 }
//! delta_carbon = { times = [1850.0, 2000.0], values = [-25.0, -26.5] }
//! delta_nitrogen = { constant = 0.0 }
//!
//! [output]
//! t_start = 0.0
//! t_end = 1000.0
//! n_points = 101
//!
//! [solver]
//! rtol = 1e-8
//! atol = 1e-10
//!
//! [[parameters]]
//! label = "reference"
//! velocity = 0.5
//! decay_rate = { attenuated = { k0 = 0.2, zh = 20.0 } }
//! ```
//!
//! Series fluxes clamp to their boundary values outside of their time range unless
//! `extrapolate = false`, in which case the run fails if the output times reach outside
//! of the series.

use crate::simulation::Simulation;
use crate::sweep::Sweep;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use soilfrac_components::parameters::DecompositionParameters;
use soilfrac_core::errors::{SoilFracError, SoilFracResult};
use soilfrac_core::flux::{BoundaryFlux, BoundaryFluxes};
use soilfrac_core::interpolate::strategies::{
    InterpolationStrategy, LinearSplineStrategy, PreviousStrategy,
};
use soilfrac_core::ivp::SolverOptions;
use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::state::PoolSet;
use soilfrac_core::timeseries::{FloatValue, Time, Timeseries};
use std::path::Path;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    #[default]
    Linear,
    Previous,
}

/// A boundary flux, or the δ-value history of a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FluxSpec {
    Constant {
        constant: FloatValue,
    },
    Series {
        times: Vec<Time>,
        values: Vec<FloatValue>,
        #[serde(default = "default_true")]
        extrapolate: bool,
        #[serde(default)]
        interpolation: InterpolationKind,
    },
}

impl FluxSpec {
    pub fn constant(value: FloatValue) -> Self {
        Self::Constant { constant: value }
    }

    /// Linearly interpolated series, clamped outside of its range
    pub fn series(times: Vec<Time>, values: Vec<FloatValue>) -> Self {
        Self::Series {
            times,
            values,
            extrapolate: true,
            interpolation: InterpolationKind::Linear,
        }
    }

    pub fn to_flux(&self) -> SoilFracResult<BoundaryFlux> {
        match self {
            FluxSpec::Constant { constant } => Ok(BoundaryFlux::constant(*constant)),
            FluxSpec::Series {
                times,
                values,
                extrapolate,
                interpolation,
            } => {
                let strategy = match interpolation {
                    InterpolationKind::Linear => {
                        InterpolationStrategy::from(LinearSplineStrategy::new(*extrapolate))
                    }
                    InterpolationKind::Previous => {
                        InterpolationStrategy::from(PreviousStrategy::new(*extrapolate))
                    }
                };
                let series = Timeseries::new(
                    Array1::from_vec(times.clone()),
                    Array1::from_vec(values.clone()),
                    strategy,
                )?;
                Ok(BoundaryFlux::from_series(series))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxConfig {
    pub carbon: FluxSpec,
    pub nitrogen: FluxSpec,
    /// δ¹³C (‰ VPDB) of the carbon input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_carbon: Option<FluxSpec>,
    /// δ¹⁵N (‰ air N₂) of the nitrogen input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_nitrogen: Option<FluxSpec>,
}

impl FluxConfig {
    pub fn to_fluxes(&self) -> SoilFracResult<BoundaryFluxes> {
        let carbon = self.carbon.to_flux()?;
        let nitrogen = self.nitrogen.to_flux()?;
        match (&self.delta_carbon, &self.delta_nitrogen) {
            (Some(delta_carbon), Some(delta_nitrogen)) => Ok(BoundaryFluxes::from_deltas(
                carbon,
                nitrogen,
                delta_carbon.to_flux()?,
                delta_nitrogen.to_flux()?,
            )),
            (None, None) => Ok(BoundaryFluxes::bulk(carbon, nitrogen)),
            _ => Err(SoilFracError::Configuration(
                "delta_carbon and delta_nitrogen must be given together".to_string(),
            )),
        }
    }
}

/// Output times, either listed or evenly spaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputConfig {
    Times {
        times: Vec<Time>,
    },
    Range {
        t_start: Time,
        t_end: Time,
        n_points: usize,
    },
}

impl OutputConfig {
    pub fn output_times(&self) -> SoilFracResult<Vec<Time>> {
        match self {
            OutputConfig::Times { times } => Ok(times.clone()),
            OutputConfig::Range {
                t_start,
                t_end,
                n_points,
            } => {
                if *n_points == 0 {
                    return Err(SoilFracError::Configuration(
                        "n_points must be at least 1".to_string(),
                    ));
                }
                if *n_points == 1 {
                    return Ok(vec![*t_start]);
                }
                let mut times = Array1::linspace(*t_start, *t_end, *n_points).to_vec();
                // Land exactly on the end point
                if let Some(last) = times.last_mut() {
                    *last = *t_end;
                }
                Ok(times)
            }
        }
    }
}

/// Configuration of a sweep of soil column simulations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub pools: PoolSet,
    pub grid: DepthGrid,
    pub fluxes: FluxConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub solver: SolverOptions,
    #[serde(default)]
    pub parameters: Vec<DecompositionParameters>,
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> SoilFracResult<Self> {
        toml::from_str(content).map_err(|e| SoilFracError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> SoilFracResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SoilFracError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| SoilFracError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn output_times(&self) -> SoilFracResult<Vec<Time>> {
        self.output.output_times()
    }

    /// The simulation shared by every member of the sweep
    pub fn simulation(&self) -> SoilFracResult<Simulation> {
        let fluxes = self.fluxes.to_fluxes()?;
        if !fluxes.supports(self.pools) {
            return Err(SoilFracError::Configuration(
                "isotopic runs need delta_carbon and delta_nitrogen fluxes".to_string(),
            ));
        }
        self.solver.validate()?;
        Ok(
            Simulation::new(self.grid.clone(), self.pools, fluxes, self.output_times()?)?
                .with_solver_options(self.solver),
        )
    }

    /// Build the sweep described by this configuration
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if the shared simulation is invalid or no
    /// parameter sets are given. Invalid parameter sets are reported by the sweep itself.
    pub fn build(&self) -> SoilFracResult<Sweep> {
        if self.parameters.is_empty() {
            return Err(SoilFracError::Configuration(
                "at least one [[parameters]] entry is required".to_string(),
            ));
        }
        Ok(Sweep::new(self.simulation()?, self.parameters.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use soilfrac_components::parameters::DecayRate;
    use soilfrac_core::ivp::SolverMethod;

    const BULK: &str = r#"
[grid]
n_cells = 50
dz = 2.0

[fluxes]
carbon = { constant = 100.0 }
nitrogen = { times = [0.0, 10.0], values = [1.0, 3.0], extrapolate = false }

[output]
times = [0.0, 1.0, 10.0]

[solver]
method = { name = "rk4", step_size = 0.1 }

[[parameters]]
label = "slow"
velocity = 0.1

[[parameters]]
label = "profile"
decay_rate = { profile = [0.1, 0.2] }
"#;

    #[test]
    fn test_parse_bulk() {
        let config = SimulationConfig::from_toml_str(BULK).unwrap();

        assert_eq!(config.pools, PoolSet::Bulk);
        assert_eq!(config.grid.size(), 50);
        assert_eq!(config.output_times().unwrap(), vec![0.0, 1.0, 10.0]);
        assert_eq!(
            config.solver.method,
            SolverMethod::Rk4 { step_size: 0.1 }
        );
        assert_eq!(config.solver.rtol, SolverOptions::default().rtol);
        assert_eq!(config.parameters.len(), 2);
        assert_eq!(config.parameters[0].velocity, 0.1);
        assert_eq!(config.parameters[0].p_c, 0.4);
        assert_eq!(
            config.parameters[1].decay_rate,
            DecayRate::Profile(vec![0.1, 0.2])
        );
    }

    #[test]
    fn test_strict_series_flux() {
        let config = SimulationConfig::from_toml_str(BULK).unwrap();
        let fluxes = config.fluxes.to_fluxes().unwrap();

        assert!(is_close!(fluxes.nitrogen.at_time(5.0).unwrap(), 2.0));
        assert!(matches!(
            fluxes.nitrogen.at_time(11.0),
            Err(SoilFracError::ExtrapolationNotAllowed { .. })
        ));
    }

    #[test]
    fn test_build_sweep() {
        let sweep = SimulationConfig::from_toml_str(BULK)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(sweep.len(), 2);
        assert_eq!(sweep.simulation().output_times(), &[0.0, 1.0, 10.0]);
    }

    #[test]
    fn test_invalid_grid_is_rejected() {
        let content = BULK.replace("dz = 2.0", "dz = -2.0");
        assert!(matches!(
            SimulationConfig::from_toml_str(&content),
            Err(SoilFracError::Config(_))
        ));
    }

    #[test]
    fn test_isotopic_needs_deltas() {
        let content = format!("pools = \"isotopic\"\n{}", BULK);
        let config = SimulationConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.build(),
            Err(SoilFracError::Configuration(_))
        ));

        let mut config = config;
        config.fluxes.delta_carbon = Some(FluxSpec::constant(-27.0));
        assert!(config.build().is_err());

        config.fluxes.delta_nitrogen = Some(FluxSpec::constant(0.0));
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_output_range() {
        let output = OutputConfig::Range {
            t_start: 0.0,
            t_end: 1.0,
            n_points: 11,
        };
        let times = output.output_times().unwrap();

        assert_eq!(times.len(), 11);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[10], 1.0);
        assert!(is_close!(times[3], 0.3));

        let empty = OutputConfig::Range {
            t_start: 0.0,
            t_end: 1.0,
            n_points: 0,
        };
        assert!(empty.output_times().is_err());
    }

    #[test]
    fn test_requires_parameters() {
        let mut config = SimulationConfig::from_toml_str(BULK).unwrap();
        config.parameters.clear();
        assert!(config.build().is_err());
    }

    #[test]
    fn test_missing_file() {
        let res = SimulationConfig::from_path("does/not/exist.toml");
        assert!(matches!(res, Err(SoilFracError::Config(_))));
    }
}
