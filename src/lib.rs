//! Advection-decomposition simulations of soil organic matter
//!
//! Organic carbon and nitrogen enter a one-dimensional soil column at the surface, are
//! carried downwards at a constant velocity and decompose at a rate that declines with
//! depth. Optionally the heavy isotopes ¹³C and ¹⁵N are tracked alongside the bulk pools,
//! with their own fractionation factors, so that the enrichment of deep soil can be
//! studied.
//!
//! The column itself lives in [`soilfrac_components`], the numerical plumbing in
//! [`soilfrac_core`]. This crate drives simulations and sweeps over parameter sets, and
//! derives C/N ratios and δ-values from the results.

pub use soilfrac_components;
pub use soilfrac_core;

pub mod config;
pub mod output;
pub mod postprocess;
pub mod scenario;
pub mod simulation;
pub mod sweep;
