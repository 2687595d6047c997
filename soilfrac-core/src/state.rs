//! Layout of the flattened model state
//!
//! The state of a soil column is a single vector holding the concentration of every tracked
//! pool in every cell. Each pool occupies a contiguous block of `n_cells` entries, in the
//! order C, N, ¹³C, ¹⁵N:
//!
//! ```text
//! | C_0 .. C_{n-1} | N_0 .. N_{n-1} | 13C_0 .. 13C_{n-1} | 15N_0 .. 15N_{n-1} |
//! ```
//!
//! The bulk-only variant stops after the N block.

use crate::errors::{SoilFracError, SoilFracResult};
use crate::isotopes::Element;
use crate::timeseries::FloatValue;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// State vector passed to the ODE solvers
pub type ModelState = DVector<FloatValue>;

/// A tracked pool of organic matter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pool {
    Carbon,
    Nitrogen,
    Carbon13,
    Nitrogen15,
}

impl Pool {
    pub fn element(&self) -> Element {
        match self {
            Pool::Carbon | Pool::Carbon13 => Element::Carbon,
            Pool::Nitrogen | Pool::Nitrogen15 => Element::Nitrogen,
        }
    }

    /// Whether the pool tracks the heavy isotope rather than the bulk element
    pub fn is_tracer(&self) -> bool {
        matches!(self, Pool::Carbon13 | Pool::Nitrogen15)
    }

    /// The bulk pool of the same element
    pub fn bulk(&self) -> Pool {
        match self.element() {
            Element::Carbon => Pool::Carbon,
            Element::Nitrogen => Pool::Nitrogen,
        }
    }

    /// The tracer pool of the same element
    pub fn tracer(&self) -> Pool {
        match self.element() {
            Element::Carbon => Pool::Carbon13,
            Element::Nitrogen => Pool::Nitrogen15,
        }
    }

    fn position(&self) -> usize {
        match self {
            Pool::Carbon => 0,
            Pool::Nitrogen => 1,
            Pool::Carbon13 => 2,
            Pool::Nitrogen15 => 3,
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pool::Carbon => "C",
            Pool::Nitrogen => "N",
            Pool::Carbon13 => "13C",
            Pool::Nitrogen15 => "15N",
        };
        write!(f, "{}", name)
    }
}

/// Which pools a simulation tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolSet {
    /// Bulk carbon and nitrogen
    #[default]
    Bulk,
    /// Bulk carbon and nitrogen plus the ¹³C and ¹⁵N tracers
    Isotopic,
}

impl PoolSet {
    pub fn pools(&self) -> &'static [Pool] {
        match self {
            PoolSet::Bulk => &[Pool::Carbon, Pool::Nitrogen],
            PoolSet::Isotopic => &[Pool::Carbon, Pool::Nitrogen, Pool::Carbon13, Pool::Nitrogen15],
        }
    }

    pub fn n_pools(&self) -> usize {
        self.pools().len()
    }

    pub fn contains(&self, pool: Pool) -> bool {
        pool.position() < self.n_pools()
    }
}

/// Maps pools to their index ranges in the flattened state vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLayout {
    pool_set: PoolSet,
    n_cells: usize,
}

impl StateLayout {
    pub fn new(pool_set: PoolSet, n_cells: usize) -> Self {
        Self { pool_set, n_cells }
    }

    pub fn pool_set(&self) -> PoolSet {
        self.pool_set
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// Total length of the state vector
    pub fn len(&self) -> usize {
        self.pool_set.n_pools() * self.n_cells
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index range of a pool
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::MissingPool`] if the pool is not part of the layout.
    pub fn range(&self, pool: Pool) -> SoilFracResult<Range<usize>> {
        if !self.pool_set.contains(pool) {
            return Err(SoilFracError::MissingPool(pool.to_string()));
        }
        let start = pool.position() * self.n_cells;
        Ok(start..start + self.n_cells)
    }

    /// All-zero state, a column without any organic matter
    pub fn zeros(&self) -> ModelState {
        ModelState::zeros(self.len())
    }

    /// Build a state vector from per-pool profiles
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if a profile does not have `n_cells` values, and
    /// [`SoilFracError::MissingPool`] for pools outside the layout.
    pub fn state_from_profiles(&self, profiles: &[(Pool, &[FloatValue])]) -> SoilFracResult<ModelState> {
        let mut state = self.zeros();
        for (pool, profile) in profiles {
            if profile.len() != self.n_cells {
                return Err(SoilFracError::Configuration(format!(
                    "profile for pool {} has {} values, expected {}",
                    pool,
                    profile.len(),
                    self.n_cells
                )));
            }
            let range = self.range(*pool)?;
            state.rows_mut(range.start, self.n_cells).copy_from_slice(profile);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_ranges_are_contiguous() {
        let layout = StateLayout::new(PoolSet::Isotopic, 10);

        assert_eq!(layout.len(), 40);
        assert_eq!(layout.range(Pool::Carbon).unwrap(), 0..10);
        assert_eq!(layout.range(Pool::Nitrogen).unwrap(), 10..20);
        assert_eq!(layout.range(Pool::Carbon13).unwrap(), 20..30);
        assert_eq!(layout.range(Pool::Nitrogen15).unwrap(), 30..40);
    }

    #[test]
    fn test_bulk_layout_has_no_tracers() {
        let layout = StateLayout::new(PoolSet::Bulk, 5);

        assert_eq!(layout.len(), 10);
        assert_eq!(
            layout.range(Pool::Carbon13),
            Err(SoilFracError::MissingPool("13C".to_string()))
        );
    }

    #[test]
    fn test_pool_relationships() {
        assert_eq!(Pool::Carbon13.bulk(), Pool::Carbon);
        assert_eq!(Pool::Nitrogen.tracer(), Pool::Nitrogen15);
        assert!(Pool::Nitrogen15.is_tracer());
        assert!(!Pool::Carbon.is_tracer());
        assert_eq!(Pool::Nitrogen15.element(), Element::Nitrogen);
    }

    #[test]
    fn test_state_from_profiles() {
        let layout = StateLayout::new(PoolSet::Bulk, 3);
        let state = layout
            .state_from_profiles(&[(Pool::Nitrogen, &[1.0, 2.0, 3.0][..])])
            .unwrap();

        assert_eq!(state.as_slice(), &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);

        let err = layout.state_from_profiles(&[(Pool::Carbon, &[1.0][..])]);
        assert!(matches!(err, Err(SoilFracError::Configuration(_))));
    }

    #[test]
    fn test_pool_set_deserialize() {
        let set: PoolSet = serde_json::from_str("\"isotopic\"").unwrap();
        assert_eq!(set, PoolSet::Isotopic);
    }
}
