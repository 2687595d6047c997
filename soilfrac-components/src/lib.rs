//! Soil column components
//!
//! - `kinetics`: first-order decay and depth attenuation of decomposition rates
//! - `parameters`: parameter sets for the column models
//! - `components`: the advection-decomposition column

pub mod components;
pub mod kinetics;
pub mod parameters;
