//! Conservation and steady-state tests for the soil column
//!
//! - Without decomposition, the column gains exactly what enters through the surface
//! - With constant inputs, the column converges to the steady-state profile
//! - Without advection, every cell below the surface decays on its own

use approx::assert_relative_eq;
use soilfrac::simulation::Simulation;
use soilfrac_components::kinetics::exponential_decay;
use soilfrac_components::parameters::DecompositionParameters;
use soilfrac_core::flux::{BoundaryFlux, BoundaryFluxes};
use soilfrac_core::ivp::{SolverMethod, SolverOptions};
use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::state::{ModelState, Pool, PoolSet};
use soilfrac_core::timeseries::{FloatValue, Timeseries};

fn constant_fluxes(carbon: FloatValue, nitrogen: FloatValue) -> BoundaryFluxes {
    BoundaryFluxes::bulk(
        BoundaryFlux::constant(carbon),
        BoundaryFlux::constant(nitrogen),
    )
}

mod mass_conservation {
    use super::*;

    fn no_decomposition(velocity: FloatValue) -> DecompositionParameters {
        DecompositionParameters::default()
            .with_velocity(velocity)
            .with_fractions(0.0, 0.0)
    }

    /// Pure transport only moves material, so the column total grows by the input.
    ///
    /// The run is short enough that nothing reaches the bottom of the column.
    #[test]
    fn test_column_total_matches_input_for_any_velocity() {
        let simulation = Simulation::new(
            DepthGrid::new(100, 1.0).unwrap(),
            PoolSet::Bulk,
            constant_fluxes(100.0, 5.0),
            vec![0.0, 5.0, 10.0, 20.0],
        )
        .unwrap();

        for velocity in [0.0, 0.5, 2.0] {
            let output = simulation.run(&no_decomposition(velocity)).unwrap();
            let carbon = output.column_totals(Pool::Carbon).unwrap();
            let nitrogen = output.column_totals(Pool::Nitrogen).unwrap();

            for (i, t) in output.times().iter().enumerate() {
                assert_relative_eq!(carbon[i], 100.0 * t, max_relative = 1e-6, epsilon = 1e-9);
                assert_relative_eq!(nitrogen[i], 5.0 * t, max_relative = 1e-6, epsilon = 1e-9);
            }
        }
    }

    /// A linearly rising input of 0 to 10 over 20 years adds 100 units.
    #[test]
    fn test_column_total_matches_integral_of_varying_input() {
        let rising = Timeseries::from_pairs(&[(0.0, 0.0), (20.0, 10.0)]).unwrap();
        let simulation = Simulation::new(
            DepthGrid::new(100, 0.5).unwrap(),
            PoolSet::Bulk,
            BoundaryFluxes::bulk(
                BoundaryFlux::from_series(rising),
                BoundaryFlux::constant(0.0),
            ),
            vec![0.0, 10.0, 20.0],
        )
        .unwrap();

        let output = simulation.run(&no_decomposition(1.0)).unwrap();
        let carbon = output.column_totals(Pool::Carbon).unwrap();

        assert_relative_eq!(carbon[1], 25.0, max_relative = 1e-6);
        assert_relative_eq!(carbon[2], 100.0, max_relative = 1e-6);
    }

    #[test]
    fn test_concentrations_stay_non_negative() {
        let simulation = Simulation::new(
            DepthGrid::new(50, 1.0).unwrap(),
            PoolSet::Bulk,
            constant_fluxes(100.0, 100.0 / 30.0),
            vec![0.0, 50.0, 200.0],
        )
        .unwrap();

        let output = simulation.run(&DecompositionParameters::default()).unwrap();
        assert!(!output.has_negative_concentrations(1e-8));
    }
}

mod steady_state {
    use super::*;

    fn simulation() -> Simulation {
        Simulation::new(
            DepthGrid::new(20, 1.0).unwrap(),
            PoolSet::Bulk,
            constant_fluxes(100.0, 100.0 / 30.0),
            vec![0.0, 1500.0, 2000.0],
        )
        .unwrap()
    }

    #[test]
    fn test_derivative_vanishes() {
        let simulation = simulation();
        let params = DecompositionParameters::default();
        let output = simulation.run(&params).unwrap();

        let last = output.state_at(output.len() - 1).unwrap();
        let state = ModelState::from_iterator(last.len(), last.iter().cloned());
        let dy_dt = simulation
            .column(&params)
            .unwrap()
            .derivative(2000.0, &state)
            .unwrap();

        assert!(dy_dt.amax() < 1e-5, "max |dX/dt| = {}", dy_dt.amax());

        let before = output.state_at(1).unwrap();
        for (a, b) in before.iter().zip(last.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-7);
        }
    }

    /// Every solver reaches the same steady state, segment after segment
    #[test]
    fn test_solvers_agree() {
        let params = DecompositionParameters::default();
        let reference = simulation().run(&params).unwrap();
        let expected = reference.final_profile(Pool::Carbon).unwrap();

        for method in [
            SolverMethod::Dop853,
            SolverMethod::Rk4 { step_size: 0.5 },
        ] {
            let output = simulation()
                .with_solver_options(SolverOptions::default().with_method(method))
                .run(&params)
                .unwrap();
            assert_eq!(output.times(), reference.times());
            let carbon = output.final_profile(Pool::Carbon).unwrap();
            for (a, b) in carbon.iter().zip(expected.iter()) {
                assert_relative_eq!(*a, *b, max_relative = 1e-6);
            }
        }
    }

    /// At steady state each cell receives what the cell above loses by advection
    #[test]
    fn test_profile_matches_cell_recursion() {
        let simulation = simulation();
        let params = DecompositionParameters::default();
        let column = simulation.column(&params).unwrap();
        let output = simulation.run(&params).unwrap();
        let carbon = output.final_profile(Pool::Carbon).unwrap();

        let v = params.velocity;
        let dz = simulation.grid().dz();
        let mut flux_in = 100.0;
        for (i, k) in column.rates().iter().enumerate() {
            let expected = flux_in / (v + k * params.p_c * dz);
            assert_relative_eq!(carbon[i], expected, max_relative = 1e-6);
            flux_in = v * expected;
        }
    }
}

mod zero_advection {
    use super::*;

    #[test]
    fn test_cells_follow_exponential_decay() {
        let grid = DepthGrid::new(10, 1.0).unwrap();
        let simulation = Simulation::new(
            grid.clone(),
            PoolSet::Bulk,
            constant_fluxes(10.0, 1.0),
            vec![0.0, 1.0, 5.0, 25.0],
        )
        .unwrap();
        let params = DecompositionParameters::default().with_velocity(0.0);
        let column = simulation.column(&params).unwrap();

        let carbon0: Vec<FloatValue> = (0..10).map(|i| 50.0 + i as FloatValue).collect();
        let nitrogen0 = vec![2.0; 10];
        let initial = column
            .layout()
            .state_from_profiles(&[
                (Pool::Carbon, carbon0.as_slice()),
                (Pool::Nitrogen, nitrogen0.as_slice()),
            ])
            .unwrap();

        let output = simulation.run_from(&params, initial).unwrap();
        let carbon = output.pool(Pool::Carbon).unwrap();
        let nitrogen = output.pool(Pool::Nitrogen).unwrap();

        for (j, t) in output.times().iter().enumerate() {
            // The surface cell also receives the input
            for i in 1..grid.size() {
                let k = column.rates()[i];
                assert_relative_eq!(
                    carbon[[j, i]],
                    exponential_decay(carbon0[i], k, params.p_c, *t),
                    max_relative = 1e-6
                );
                assert_relative_eq!(
                    nitrogen[[j, i]],
                    exponential_decay(nitrogen0[i], k, params.p_n, *t),
                    max_relative = 1e-6
                );
            }
        }
        let surface_decay = exponential_decay(carbon0[0], column.rates()[0], params.p_c, 25.0);
        assert!(carbon[[3, 0]] > surface_decay);
    }
}
