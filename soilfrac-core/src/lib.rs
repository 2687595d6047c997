//! Core types for soil column isotope models
//!
//! Provides the building blocks shared by every column model: the vertical [`spatial`] grid,
//! the layout of the flattened [`state`], externally supplied [`timeseries`] and their
//! [`interpolate`] strategies, surface [`flux`] boundary conditions, [`isotopes`] arithmetic
//! and the [`ivp`] plumbing around `ode_solvers`.

pub mod errors;
pub mod flux;
pub mod interpolate;
pub mod isotopes;
pub mod ivp;
pub mod spatial;
pub mod state;
pub mod timeseries;
