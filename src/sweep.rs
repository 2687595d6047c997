//! Parameter sweeps
//!
//! A [`Sweep`] runs one [`Simulation`] for each of an ordered list of parameter sets. The
//! members share nothing mutable, so they are run in parallel with rayon. Results keep the
//! order of the input parameter sets. A member that fails is reported with its index and
//! does not stop the others.

use crate::output::SimulationOutput;
use crate::simulation::Simulation;
use log::{info, warn};
use ndarray::Array1;
use rayon::prelude::*;
use soilfrac_components::parameters::DecompositionParameters;
use soilfrac_core::errors::{SoilFracError, SoilFracResult};
use soilfrac_core::state::Pool;
use soilfrac_core::timeseries::FloatValue;

/// Outcome of one member of a sweep
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub index: usize,
    pub parameters: DecompositionParameters,
    pub outcome: SoilFracResult<SimulationOutput>,
}

impl SweepResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct Sweep {
    simulation: Simulation,
    parameters: Vec<DecompositionParameters>,
}

impl Sweep {
    pub fn new(simulation: Simulation, parameters: Vec<DecompositionParameters>) -> Self {
        Self {
            simulation,
            parameters,
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn parameters(&self) -> &[DecompositionParameters] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Run every member in parallel
    pub fn run(&self) -> SweepSummary {
        info!("Running sweep of {} parameter sets", self.parameters.len());
        let results = self
            .parameters
            .par_iter()
            .enumerate()
            .map(|(index, parameters)| self.run_member(index, parameters))
            .collect();
        self.summarise(results)
    }

    /// Run every member on the current thread
    pub fn run_sequential(&self) -> SweepSummary {
        info!(
            "Running sweep of {} parameter sets sequentially",
            self.parameters.len()
        );
        let results = self
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameters)| self.run_member(index, parameters))
            .collect();
        self.summarise(results)
    }

    fn run_member(&self, index: usize, parameters: &DecompositionParameters) -> SweepResult {
        let outcome = self.simulation.run(parameters);
        if let Err(e) = &outcome {
            warn!(
                "Sweep member {} ({}) failed: {}",
                index,
                parameters.describe(),
                e
            );
        }
        SweepResult {
            index,
            parameters: parameters.clone(),
            outcome,
        }
    }

    fn summarise(&self, results: Vec<SweepResult>) -> SweepSummary {
        let summary = SweepSummary { results };
        info!(
            "Sweep finished: {} succeeded, {} failed",
            summary.successes().count(),
            summary.failures().count()
        );
        summary
    }
}

/// Results of a sweep in the order of its parameter sets
#[derive(Debug, Clone)]
pub struct SweepSummary {
    results: Vec<SweepResult>,
}

impl SweepSummary {
    pub fn results(&self) -> &[SweepResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<SweepResult> {
        self.results
    }

    pub fn successes(&self) -> impl Iterator<Item = (&SweepResult, &SimulationOutput)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|out| (r, out)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SweepResult, &SoilFracError)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r, e)))
    }

    /// Final profile of `pool` for each successful member, keyed by member index
    pub fn final_profiles(&self, pool: Pool) -> SoilFracResult<Vec<(usize, Array1<FloatValue>)>> {
        self.successes()
            .map(|(r, out)| Ok((r.index, out.final_profile(pool)?)))
            .collect()
    }
}
