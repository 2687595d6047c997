//! Stable isotope ratio arithmetic
//!
//! Isotopic composition is reported in δ-notation, the per mil (‰) deviation of an
//! isotope ratio $R$ (heavy/light) from that of a reference standard:
//!
//! $$ \delta = \left( \frac{R - R_{std}}{R_{std}} \right) \times 1000 $$
//!
//! [`delta_to_ratio`] and [`ratio_to_delta`] are exact algebraic inverses.

use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// ¹³C/¹²C ratio of the Vienna Pee Dee Belemnite standard
pub const R_VPDB: FloatValue = 0.0112372;

/// ¹⁵N/¹⁴N ratio of atmospheric N₂
pub const R_AIR_N2: FloatValue = 0.003676;

/// Convert a δ-value (‰) to an isotope ratio
pub fn delta_to_ratio(delta: FloatValue, standard: FloatValue) -> FloatValue {
    (1000.0 + delta) * standard / 1000.0
}

/// Convert an isotope ratio to a δ-value (‰)
pub fn ratio_to_delta(ratio: FloatValue, standard: FloatValue) -> FloatValue {
    ((ratio - standard) / standard) * 1000.0
}

/// Elements with a tracked stable isotope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Carbon,
    Nitrogen,
}

impl Element {
    /// Reference ratio used for δ-notation
    pub fn standard(&self) -> FloatValue {
        match self {
            Element::Carbon => R_VPDB,
            Element::Nitrogen => R_AIR_N2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::Carbon => "C",
            Element::Nitrogen => "N",
        }
    }
}
