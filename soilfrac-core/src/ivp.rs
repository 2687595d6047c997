//! Initial value problems solved with `ode_solvers`
//!
//! Components describe their dynamics by implementing [`IVP`]. An [`IVPBuilder`] wraps a
//! component and an initial state and advances it between two times with one of the
//! [`SolverMethod`]s. The adaptive methods control the local error with the relative and
//! absolute tolerances of [`SolverOptions`] and give up after `max_steps` steps.

use crate::errors::{SoilFracError, SoilFracResult};
use crate::state::ModelState;
use crate::timeseries::{FloatValue, Time};
use log::debug;
use ode_solvers::dop_shared::OutputType;
use ode_solvers::{Dop853, Dopri5, Rk4, System};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A system of ordinary differential equations `dy/dt = f(t, y)`
pub trait IVP<T, S> {
    /// Evaluate `f(t, y)` into `dy_dt`
    ///
    /// Must be a pure function of `t` and `y`.
    fn calculate_dy_dt(&self, t: T, y: &S, dy_dt: &mut S);

    /// Check that the system can be evaluated over `[t_start, t_end]`
    fn check_span(&self, _t_start: T, _t_end: T) -> SoilFracResult<()> {
        Ok(())
    }
}

/// Integration algorithm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum SolverMethod {
    /// Dormand-Prince 5(4) with step size control and stiffness detection
    Dopri5,
    /// Dormand-Prince 8(5,3)
    Dop853,
    /// Classic fixed-step Runge-Kutta
    ///
    /// The step is shortened where needed so that it divides each integration interval.
    Rk4 { step_size: FloatValue },
}

/// Solver options for the ODE integration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub method: SolverMethod,
    pub rtol: FloatValue,
    pub atol: FloatValue,
    /// Maximum number of steps per integration interval
    pub max_steps: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: SolverMethod::Dopri5,
            rtol: 1e-8,
            atol: 1e-10,
            max_steps: 100_000,
        }
    }
}

impl SolverOptions {
    pub fn with_tolerances(self, rtol: FloatValue, atol: FloatValue) -> Self {
        Self { rtol, atol, ..self }
    }

    pub fn with_method(self, method: SolverMethod) -> Self {
        Self { method, ..self }
    }

    pub fn with_max_steps(self, max_steps: u32) -> Self {
        Self { max_steps, ..self }
    }

    pub fn validate(&self) -> SoilFracResult<()> {
        if self.rtol.is_nan() || self.rtol <= 0.0 || self.atol.is_nan() || self.atol < 0.0 {
            return Err(SoilFracError::Configuration(format!(
                "tolerances must be positive, got rtol={} atol={}",
                self.rtol, self.atol
            )));
        }
        if self.max_steps == 0 {
            return Err(SoilFracError::Configuration(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if let SolverMethod::Rk4 { step_size } = self.method {
            if !step_size.is_finite() || step_size <= 0.0 {
                return Err(SoilFracError::Configuration(format!(
                    "step size must be positive, got {}",
                    step_size
                )));
            }
        }
        Ok(())
    }
}

/// Adapter exposing an [`IVP`] to `ode_solvers`
struct IVPSystem<C> {
    component: Arc<C>,
}

impl<C: IVP<Time, ModelState>> System<Time, ModelState> for IVPSystem<C> {
    fn system(&self, t: Time, y: &ModelState, dy: &mut ModelState) {
        self.component.calculate_dy_dt(t, y, dy)
    }
}

pub struct IVPBuilder<C> {
    component: Arc<C>,
    y0: ModelState,
}

impl<C: IVP<Time, ModelState>> IVPBuilder<C> {
    pub fn new(component: Arc<C>, y0: ModelState) -> Self {
        Self { component, y0 }
    }

    /// Integrate from `t_current` to `t_next` and return the state at `t_next`
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::IntegrationFailure`] if the solver gives up (step budget
    /// exhausted, step size collapse or stiffness), does not reach `t_next`, or produces a
    /// non-finite state.
    pub fn solve(
        self,
        t_current: Time,
        t_next: Time,
        options: &SolverOptions,
    ) -> SoilFracResult<ModelState> {
        if t_next == t_current {
            return Ok(self.y0);
        }
        if t_next < t_current {
            return Err(SoilFracError::Configuration(format!(
                "cannot integrate backwards from {} to {}",
                t_current, t_next
            )));
        }
        self.component.check_span(t_current, t_next)?;

        let system = IVPSystem {
            component: Arc::clone(&self.component),
        };
        let span = t_next - t_current;

        let state = match options.method {
            SolverMethod::Dopri5 => {
                let mut solver = Dopri5::from_param(
                    system,
                    t_current,
                    t_next,
                    0.0,
                    self.y0,
                    options.rtol,
                    options.atol,
                    0.9,
                    0.04,
                    0.2,
                    10.0,
                    span,
                    0.0,
                    options.max_steps,
                    1000,
                    OutputType::Sparse,
                );
                solver
                    .integrate()
                    .map_err(|e| failure(t_current, format!("{:?}", e)))?;
                let (times, states) = solver.results().get();
                get_last_step(times, states, t_next)?
            }
            SolverMethod::Dop853 => {
                let mut solver = Dop853::from_param(
                    system,
                    t_current,
                    t_next,
                    0.0,
                    self.y0,
                    options.rtol,
                    options.atol,
                    0.9,
                    0.0,
                    0.333,
                    6.0,
                    span,
                    0.0,
                    options.max_steps,
                    1000,
                    OutputType::Sparse,
                );
                solver
                    .integrate()
                    .map_err(|e| failure(t_current, format!("{:?}", e)))?;
                // Sparse output from Dop853 is stamped with the start time, so only the
                // states are usable. A successful integration has reached `t_next`.
                solver
                    .y_out()
                    .last()
                    .cloned()
                    .ok_or_else(|| failure(t_current, "solver produced no output".to_string()))?
            }
            SolverMethod::Rk4 { step_size } => {
                let n_steps = (span / step_size).ceil().max(1.0);
                if n_steps > options.max_steps as FloatValue {
                    return Err(failure(
                        t_current,
                        format!(
                            "{} fixed steps required, exceeding the budget of {}",
                            n_steps, options.max_steps
                        ),
                    ));
                }
                let mut solver = Rk4::new(system, t_current, self.y0, t_next, span / n_steps);
                solver
                    .integrate()
                    .map_err(|e| failure(t_current, format!("{:?}", e)))?;
                let (times, states) = solver.results().get();
                get_last_step(times, states, t_next)?
            }
        };

        if state.iter().any(|v| !v.is_finite()) {
            return Err(failure(
                t_current,
                "state became non-finite".to_string(),
            ));
        }

        Ok(state)
    }
}

fn failure(time: Time, reason: String) -> SoilFracError {
    SoilFracError::IntegrationFailure { time, reason }
}

/// Get the state of the last output step at `t_expected`
///
/// Fixed-step solvers may emit one step past the end of the interval due to rounding, so
/// the output is searched from the end for a step within tolerance of `t_expected`.
pub fn get_last_step(
    times: &[Time],
    states: &[ModelState],
    t_expected: Time,
) -> SoilFracResult<ModelState> {
    let t_last = match times.last() {
        Some(t) => *t,
        None => {
            return Err(failure(
                t_expected,
                "solver produced no output".to_string(),
            ))
        }
    };

    let tolerance = 1e-9 * t_expected.abs().max(1.0);
    let index = times
        .iter()
        .rposition(|t| (t - t_expected).abs() <= tolerance)
        .ok_or_else(|| {
            failure(
                t_last,
                format!("solver stopped before reaching t={}", t_expected),
            )
        })?;
    debug!("Reached t={} after {} output steps", times[index], index);

    states
        .get(index)
        .cloned()
        .ok_or_else(|| failure(t_expected, "solver output is incomplete".to_string()))
}
