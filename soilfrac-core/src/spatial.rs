//! Vertical discretisation of a soil column
//!
//! The column is split into `n` cells of equal thickness `dz`. Cell `i` is located at depth
//! `z_i = i * dz`, so the first cell is the soil surface (`z = 0`). Concentrations are tracked
//! per cell; column totals are obtained by multiplying by the cell thickness.
//!
//! # Examples
//!
//! ```rust
//! use soilfrac_core::spatial::DepthGrid;
//!
//! let grid = DepthGrid::new(4, 0.5).unwrap();
//! assert_eq!(grid.size(), 4);
//! assert_eq!(grid.depths().to_vec(), vec![0.0, 0.5, 1.0, 1.5]);
//!
//! // Total mass of a uniform profile of 2.0 units per unit depth
//! let total = grid.column_total(&[2.0, 2.0, 2.0, 2.0]);
//! assert_eq!(total, 4.0);
//! ```

use crate::errors::{SoilFracError, SoilFracResult};
use crate::timeseries::FloatValue;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Uniform 1-D depth grid
///
/// Immutable once constructed. Invariant: `n_cells >= 1` and `dz` is finite and positive,
/// so depths are strictly increasing with uniform spacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DepthGridSpec")]
pub struct DepthGrid {
    n_cells: usize,
    dz: FloatValue,
}

#[derive(Deserialize)]
struct DepthGridSpec {
    n_cells: usize,
    dz: FloatValue,
}

impl TryFrom<DepthGridSpec> for DepthGrid {
    type Error = SoilFracError;

    fn try_from(spec: DepthGridSpec) -> SoilFracResult<Self> {
        DepthGrid::new(spec.n_cells, spec.dz)
    }
}

impl DepthGrid {
    /// Create a new depth grid
    ///
    /// # Errors
    ///
    /// Returns [`SoilFracError::Configuration`] if `n_cells` is zero or `dz` is not a finite,
    /// positive number.
    pub fn new(n_cells: usize, dz: FloatValue) -> SoilFracResult<Self> {
        if n_cells == 0 {
            return Err(SoilFracError::Configuration(
                "depth grid requires at least one cell".to_string(),
            ));
        }
        if !dz.is_finite() || dz <= 0.0 {
            return Err(SoilFracError::Configuration(format!(
                "cell thickness must be positive, got dz={}",
                dz
            )));
        }
        Ok(Self { n_cells, dz })
    }

    pub fn grid_name(&self) -> &'static str {
        "Depth"
    }

    /// Number of cells in the column
    pub fn size(&self) -> usize {
        self.n_cells
    }

    /// Cell thickness
    pub fn dz(&self) -> FloatValue {
        self.dz
    }

    /// Depth of each cell, starting at the surface
    pub fn depths(&self) -> Array1<FloatValue> {
        Array1::from_iter((0..self.n_cells).map(|i| self.depth(i)))
    }

    pub fn depth(&self, index: usize) -> FloatValue {
        index as FloatValue * self.dz
    }

    /// Depth of the deepest cell
    pub fn bottom_depth(&self) -> FloatValue {
        self.depth(self.n_cells - 1)
    }

    /// Integrate a per-cell concentration profile over the column
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` does not match `self.size()`
    pub fn column_total(&self, values: &[FloatValue]) -> FloatValue {
        assert_eq!(
            values.len(),
            self.n_cells,
            "Profile length must match grid size"
        );
        values.iter().sum::<FloatValue>() * self.dz
    }
}
