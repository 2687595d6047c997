//! Integration of soil columns over a set of output times
//!
//! [`integrate`] drives any [`IVP`] through an ordered sequence of output times. The solver is
//! restarted at each output time so that every requested time is hit exactly rather than
//! approximated by the nearest internal step.
//!
//! [`Simulation`] fixes everything about a run except the decomposition parameters, so the
//! same simulation can be run for each member of a parameter sweep.

use crate::output::SimulationOutput;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use soilfrac_components::components::DecompositionColumn;
use soilfrac_components::parameters::DecompositionParameters;
use soilfrac_core::errors::{SoilFracError, SoilFracResult};
use soilfrac_core::flux::BoundaryFluxes;
use soilfrac_core::ivp::{IVPBuilder, SolverOptions, IVP};
use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::state::{ModelState, PoolSet};
use soilfrac_core::timeseries::Time;
use std::sync::Arc;

/// Check output times are finite and non-decreasing
pub fn validate_output_times(output_times: &[Time]) -> SoilFracResult<()> {
    if output_times.is_empty() {
        return Err(SoilFracError::Configuration(
            "at least one output time is required".to_string(),
        ));
    }
    if let Some(t) = output_times.iter().find(|t| !t.is_finite()) {
        return Err(SoilFracError::Configuration(format!(
            "output time {} is not finite",
            t
        )));
    }
    if let Some(w) = output_times.windows(2).find(|w| w[1] < w[0]) {
        return Err(SoilFracError::Configuration(format!(
            "output times must be non-decreasing, found {} after {}",
            w[1], w[0]
        )));
    }
    Ok(())
}

/// Integrate `component` from `initial` and record the state at each output time
///
/// The first output time is the initial time. Returns exactly one state per output time,
/// repeated times yield repeated states.
///
/// # Errors
///
/// Returns [`SoilFracError::Configuration`] for invalid output times or solver options and
/// [`SoilFracError::IntegrationFailure`] if any interval cannot be integrated.
pub fn integrate<C: IVP<Time, ModelState>>(
    component: Arc<C>,
    initial: ModelState,
    output_times: &[Time],
    options: &SolverOptions,
) -> SoilFracResult<Vec<ModelState>> {
    validate_output_times(output_times)?;
    options.validate()?;

    let mut states = Vec::with_capacity(output_times.len());
    let mut current = initial;
    states.push(current.clone());

    for w in output_times.windows(2) {
        let (t_current, t_next) = (w[0], w[1]);
        if t_next > t_current {
            current = IVPBuilder::new(Arc::clone(&component), current).solve(
                t_current, t_next, options,
            )?;
        }
        states.push(current.clone());
    }

    Ok(states)
}

/// Everything needed to run a soil column apart from its decomposition parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    grid: DepthGrid,
    pool_set: PoolSet,
    fluxes: BoundaryFluxes,
    output_times: Vec<Time>,
    solver_options: SolverOptions,
}

impl Simulation {
    /// Create a new simulation with default solver options
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if the output times are invalid or the fluxes do
    /// not cover the pool set.
    pub fn new(
        grid: DepthGrid,
        pool_set: PoolSet,
        fluxes: BoundaryFluxes,
        output_times: Vec<Time>,
    ) -> SoilFracResult<Self> {
        validate_output_times(&output_times)?;
        if !fluxes.supports(pool_set) {
            return Err(SoilFracError::Configuration(format!(
                "boundary fluxes do not cover every pool of the {:?} pool set",
                pool_set
            )));
        }
        Ok(Self {
            grid,
            pool_set,
            fluxes,
            output_times,
            solver_options: SolverOptions::default(),
        })
    }

    pub fn with_solver_options(self, solver_options: SolverOptions) -> Self {
        Self {
            solver_options,
            ..self
        }
    }

    pub fn grid(&self) -> &DepthGrid {
        &self.grid
    }

    pub fn pool_set(&self) -> PoolSet {
        self.pool_set
    }

    pub fn fluxes(&self) -> &BoundaryFluxes {
        &self.fluxes
    }

    pub fn output_times(&self) -> &[Time] {
        &self.output_times
    }

    pub fn solver_options(&self) -> &SolverOptions {
        &self.solver_options
    }

    /// Build the column component for a parameter set
    pub fn column(&self, parameters: &DecompositionParameters) -> SoilFracResult<DecompositionColumn> {
        DecompositionColumn::new(
            self.grid.clone(),
            parameters.clone(),
            self.pool_set,
            self.fluxes.clone(),
        )
    }

    /// Run from an empty column, without any organic matter
    pub fn run(&self, parameters: &DecompositionParameters) -> SoilFracResult<SimulationOutput> {
        let column = self.column(parameters)?;
        let initial = column.layout().zeros();
        self.integrate_column(column, initial)
    }

    /// Run from a given initial state
    pub fn run_from(
        &self,
        parameters: &DecompositionParameters,
        initial: ModelState,
    ) -> SoilFracResult<SimulationOutput> {
        let column = self.column(parameters)?;
        if initial.len() != column.layout().len() {
            return Err(SoilFracError::Configuration(format!(
                "initial state has {} values, expected {}",
                initial.len(),
                column.layout().len()
            )));
        }
        self.integrate_column(column, initial)
    }

    fn integrate_column(
        &self,
        column: DecompositionColumn,
        initial: ModelState,
    ) -> SoilFracResult<SimulationOutput> {
        let description = column.parameters().describe();
        let layout = *column.layout();
        debug!(
            "Integrating {} over {} output times",
            description,
            self.output_times.len()
        );

        let states = integrate(
            Arc::new(column),
            initial,
            &self.output_times,
            &self.solver_options,
        )?;
        let output = SimulationOutput::new(&self.output_times, &states, &self.grid, layout)?;

        let tolerance = self.solver_options.atol.max(1e-12) * 1e3;
        if output.has_negative_concentrations(tolerance) {
            warn!(
                "Negative concentrations in run {}; the solution is not physically valid",
                description
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use soilfrac_core::flux::BoundaryFlux;
    use soilfrac_core::ivp::SolverMethod;
    use soilfrac_core::state::Pool;
    use soilfrac_core::timeseries::FloatValue;

    struct Growth;

    impl IVP<Time, ModelState> for Growth {
        fn calculate_dy_dt(&self, _t: Time, y: &ModelState, dy_dt: &mut ModelState) {
            dy_dt.copy_from(y);
        }
    }

    fn simulation(output_times: Vec<Time>) -> Simulation {
        Simulation::new(
            DepthGrid::new(10, 1.0).unwrap(),
            PoolSet::Bulk,
            BoundaryFluxes::bulk(BoundaryFlux::constant(10.0), BoundaryFlux::constant(1.0)),
            output_times,
        )
        .unwrap()
    }

    #[test]
    fn test_one_row_per_output_time() {
        let times = vec![0.0, 0.3, 0.3, 1.0, 2.5];
        let states = integrate(
            Arc::new(Growth),
            ModelState::from_vec(vec![1.0]),
            &times,
            &SolverOptions::default(),
        )
        .unwrap();

        assert_eq!(states.len(), times.len());
        for (t, y) in times.iter().zip(states.iter()) {
            assert!(is_close!(y[0], t.exp(), rel_tol = 1e-6), "t={}", t);
        }
        assert_eq!(states[1], states[2]);
    }

    #[test]
    fn test_invalid_output_times() {
        assert!(validate_output_times(&[]).is_err());
        assert!(validate_output_times(&[0.0, 2.0, 1.0]).is_err());
        assert!(validate_output_times(&[0.0, FloatValue::INFINITY]).is_err());
        assert!(validate_output_times(&[5.0]).is_ok());
    }

    #[test]
    fn test_run_starts_from_empty_column() {
        let sim = simulation(vec![0.0, 1.0]);
        let output = sim.run(&DecompositionParameters::default()).unwrap();

        let carbon = output.pool(Pool::Carbon).unwrap();
        assert_eq!(carbon.shape(), &[2, 10]);
        assert!(carbon.row(0).iter().all(|v| *v == 0.0));
        assert!(carbon[[1, 0]] > 0.0);
    }

    #[test]
    fn test_run_from_checks_length() {
        let sim = simulation(vec![0.0, 1.0]);
        let res = sim.run_from(&DecompositionParameters::default(), ModelState::zeros(3));
        assert!(matches!(res, Err(SoilFracError::Configuration(_))));
    }

    #[test]
    fn test_step_budget_failure_is_reported() {
        let sim = simulation(vec![0.0, 100.0]).with_solver_options(
            SolverOptions::default()
                .with_method(SolverMethod::Rk4 { step_size: 0.01 })
                .with_max_steps(100),
        );
        let res = sim.run(&DecompositionParameters::default());
        assert!(matches!(
            res,
            Err(SoilFracError::IntegrationFailure { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_tracer_fluxes() {
        let res = Simulation::new(
            DepthGrid::new(3, 1.0).unwrap(),
            PoolSet::Isotopic,
            BoundaryFluxes::bulk(BoundaryFlux::constant(1.0), BoundaryFlux::constant(1.0)),
            vec![0.0, 1.0],
        );
        assert!(res.is_err());
    }
}
