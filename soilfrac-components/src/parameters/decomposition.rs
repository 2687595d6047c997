//! Decomposition Parameters
//!
//! Parameters of the advection-decomposition soil column: the downward transport velocity,
//! the depth-dependent decomposition rate and the kinetics of carbon, nitrogen and their
//! heavy isotopes.

use crate::kinetics::decay_rate_profile;
use serde::{Deserialize, Serialize};
use soilfrac_core::errors::{SoilFracError, SoilFracResult};
use soilfrac_core::spatial::DepthGrid;
use soilfrac_core::state::Pool;
use soilfrac_core::timeseries::FloatValue;

/// How the decomposition rate varies with depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayRate {
    /// Basal rate `k0` at the surface, attenuated exponentially with e-folding depth `zh`
    Attenuated { k0: FloatValue, zh: FloatValue },
    /// Explicit rate for every cell of the grid, starting at the surface
    Profile(Vec<FloatValue>),
}

/// Parameters for one simulation of the soil column
///
/// Immutable once constructed. A sweep holds one of these per member and hands each to
/// its own simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionParameters {
    /// Optional name used when reporting sweep results
    pub label: Option<String>,

    /// Downward advection velocity
    /// unit: depth / yr
    /// default: 0.5
    pub velocity: FloatValue,

    /// Decomposition rate as a function of depth
    /// unit: 1 / yr
    /// default: k0 = 0.2, zh = 20
    pub decay_rate: DecayRate,

    /// Fraction of decomposed carbon that is not returned to the pool
    /// unit: dimensionless
    /// default: 0.4
    pub p_c: FloatValue,

    /// Fraction of decomposed nitrogen that is not returned to the pool
    /// unit: dimensionless
    /// default: 0.3
    pub p_n: FloatValue,

    /// Fractionation factor applied to the loss of ¹³C
    /// unit: dimensionless
    /// default: 1.0 (no fractionation)
    pub alpha_c: FloatValue,

    /// Fractionation factor applied to the loss of ¹⁵N
    /// unit: dimensionless
    /// default: 1.0 (no fractionation)
    pub alpha_n: FloatValue,
}

impl Default for DecompositionParameters {
    fn default() -> Self {
        Self {
            label: None,
            velocity: 0.5,
            decay_rate: DecayRate::Attenuated { k0: 0.2, zh: 20.0 },
            p_c: 0.4,
            p_n: 0.3,
            alpha_c: 1.0,
            alpha_n: 1.0,
        }
    }
}

impl DecompositionParameters {
    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn with_velocity(self, velocity: FloatValue) -> Self {
        Self { velocity, ..self }
    }

    pub fn with_decay_rate(self, decay_rate: DecayRate) -> Self {
        Self { decay_rate, ..self }
    }

    pub fn with_fractions(self, p_c: FloatValue, p_n: FloatValue) -> Self {
        Self { p_c, p_n, ..self }
    }

    pub fn with_fractionation(self, alpha_c: FloatValue, alpha_n: FloatValue) -> Self {
        Self {
            alpha_c,
            alpha_n,
            ..self
        }
    }

    /// Fraction not returned for a pool; tracers share the value of their element
    pub fn fraction_lost(&self, pool: Pool) -> FloatValue {
        match pool {
            Pool::Carbon | Pool::Carbon13 => self.p_c,
            Pool::Nitrogen | Pool::Nitrogen15 => self.p_n,
        }
    }

    /// Fractionation factor for a pool, 1 for bulk pools
    pub fn fractionation(&self, pool: Pool) -> FloatValue {
        match pool {
            Pool::Carbon | Pool::Nitrogen => 1.0,
            Pool::Carbon13 => self.alpha_c,
            Pool::Nitrogen15 => self.alpha_n,
        }
    }

    /// Name used in log messages
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!(
                "v={} p_c={} p_n={} alpha_c={} alpha_n={}",
                self.velocity, self.p_c, self.p_n, self.alpha_c, self.alpha_n
            ),
        }
    }

    /// Check the parameters are usable
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if the velocity is negative or not finite,
    /// `zh` is not positive, a rate is negative, or a fraction or fractionation factor
    /// is negative or not finite.
    pub fn validate(&self) -> SoilFracResult<()> {
        if !self.velocity.is_finite() || self.velocity < 0.0 {
            return Err(SoilFracError::Configuration(format!(
                "advection velocity must be non-negative, got {}",
                self.velocity
            )));
        }
        match &self.decay_rate {
            DecayRate::Attenuated { k0, zh } => {
                if !zh.is_finite() || *zh <= 0.0 {
                    return Err(SoilFracError::Configuration(format!(
                        "attenuation depth zh must be positive, got {}",
                        zh
                    )));
                }
                if !k0.is_finite() || *k0 < 0.0 {
                    return Err(SoilFracError::Configuration(format!(
                        "basal decomposition rate must be non-negative, got {}",
                        k0
                    )));
                }
            }
            DecayRate::Profile(rates) => {
                if let Some(k) = rates.iter().find(|k| !k.is_finite() || **k < 0.0) {
                    return Err(SoilFracError::Configuration(format!(
                        "decomposition rates must be non-negative, got {}",
                        k
                    )));
                }
            }
        }
        for (name, value) in [
            ("p_c", self.p_c),
            ("p_n", self.p_n),
            ("alpha_c", self.alpha_c),
            ("alpha_n", self.alpha_n),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SoilFracError::Configuration(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Decomposition rate of every cell of `grid`
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if the parameters are invalid or an explicit
    /// rate profile does not have one value per cell.
    pub fn rate_profile(&self, grid: &DepthGrid) -> SoilFracResult<Vec<FloatValue>> {
        self.validate()?;
        match &self.decay_rate {
            DecayRate::Attenuated { k0, zh } => Ok(decay_rate_profile(grid, *k0, *zh)),
            DecayRate::Profile(rates) => {
                if rates.len() != grid.size() {
                    return Err(SoilFracError::Configuration(format!(
                        "rate profile has {} values but the grid has {} cells",
                        rates.len(),
                        grid.size()
                    )));
                }
                Ok(rates.clone())
            }
        }
    }
}
