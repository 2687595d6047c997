//! Component parameters
//!
//! Each parameter struct provides defaults matching the reference soil column used in the
//! fractionation experiments.

mod decomposition;

pub use decomposition::{DecayRate, DecompositionParameters};
