//! Reference scenarios
//!
//! The reference column is 100 cells of unit thickness fed with 100 units of carbon per
//! year at a C/N of 30 and integrated for 1000 years from an empty column. By then the
//! surface cell has reached a steady state where the input balances advection and
//! decomposition:
//!
//! $$ 0 = \frac{F_X - v X_0}{\Delta z} - k_0 p_X \alpha_X X_0
//!    \quad\Rightarrow\quad X_0 = \frac{F_X}{v + k_0 p_X \alpha_X \Delta z} $$

use crate::config::{FluxConfig, FluxSpec, OutputConfig, SimulationConfig};
use soilfrac_components::parameters::DecompositionParameters;
use soilfrac_core::errors::SoilFracResult;
use soilfrac_core::ivp::SolverOptions;
use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::state::{Pool, PoolSet};
use soilfrac_core::timeseries::FloatValue;

pub const REFERENCE_CARBON_INPUT: FloatValue = 100.0;
pub const REFERENCE_INPUT_CN: FloatValue = 30.0;

pub fn reference_grid() -> SoilFracResult<DepthGrid> {
    DepthGrid::new(100, 1.0)
}

/// v = 0.5, k0 = 0.2, zh = 20, p_C = 0.4, p_N = 0.3 and no fractionation
pub fn reference_parameters() -> DecompositionParameters {
    DecompositionParameters::default().with_label("reference")
}

/// Bulk reference run with constant inputs over 1000 years
pub fn reference_scenario() -> SoilFracResult<SimulationConfig> {
    Ok(SimulationConfig {
        pools: PoolSet::Bulk,
        grid: reference_grid()?,
        fluxes: FluxConfig {
            carbon: FluxSpec::constant(REFERENCE_CARBON_INPUT),
            nitrogen: FluxSpec::constant(REFERENCE_CARBON_INPUT / REFERENCE_INPUT_CN),
            delta_carbon: None,
            delta_nitrogen: None,
        },
        output: OutputConfig::Range {
            t_start: 0.0,
            t_end: 1000.0,
            n_points: 101,
        },
        solver: SolverOptions::default(),
        parameters: vec![reference_parameters()],
    })
}

/// Reference run with isotope tracers, one member per pair of fractionation factors
///
/// `delta_carbon` and `delta_nitrogen` give the isotopic composition of the inputs, for
/// instance a δ¹³C history of plant material.
pub fn isotopic_scenario(
    delta_carbon: FluxSpec,
    delta_nitrogen: FluxSpec,
    fractionation: &[(FloatValue, FloatValue)],
) -> SoilFracResult<SimulationConfig> {
    let mut config = reference_scenario()?;
    config.pools = PoolSet::Isotopic;
    config.fluxes.delta_carbon = Some(delta_carbon);
    config.fluxes.delta_nitrogen = Some(delta_nitrogen);
    config.parameters = fractionation
        .iter()
        .map(|(alpha_c, alpha_n)| {
            DecompositionParameters::default()
                .with_fractionation(*alpha_c, *alpha_n)
                .with_label(format!("alpha_c={} alpha_n={}", alpha_c, alpha_n))
        })
        .collect();
    Ok(config)
}

/// Steady-state concentration of `pool` in the surface cell under a constant input `flux`
///
/// Only the surface cell has a closed form since every cell below depends on the one
/// above it.
pub fn surface_steady_state(
    parameters: &DecompositionParameters,
    grid: &DepthGrid,
    pool: Pool,
    flux: FloatValue,
) -> SoilFracResult<FloatValue> {
    let k0 = parameters.rate_profile(grid)?[0];
    let loss = k0 * parameters.fraction_lost(pool) * parameters.fractionation(pool);
    Ok(flux / (parameters.velocity + loss * grid.dz()))
}

/// Steady-state C/N of the surface cell under constant inputs
pub fn surface_cn_steady_state(
    parameters: &DecompositionParameters,
    grid: &DepthGrid,
    carbon_flux: FloatValue,
    nitrogen_flux: FloatValue,
) -> SoilFracResult<FloatValue> {
    let carbon = surface_steady_state(parameters, grid, Pool::Carbon, carbon_flux)?;
    let nitrogen = surface_steady_state(parameters, grid, Pool::Nitrogen, nitrogen_flux)?;
    Ok(carbon / nitrogen)
}
