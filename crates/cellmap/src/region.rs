//! Grid cell coordinates.
//!
//! A [`Region`] names one cell of the grid by (row, column). Regions are
//! derived from entity positions on demand, never stored on the entity, so
//! they can't drift out of sync with the position they were computed from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// (row, column) address of one grid cell.
///
/// The sentinel [`Region::OVERFLOW`] stands for "not in any cell": the entity
/// is oversized for the grid's cell dimension, or its position maps outside
/// the valid row/column range.
///
/// # Ordering
///
/// Regions order row-major (row first, then column), which fixes the cell
/// visit order of range queries and keeps their output deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Region {
    /// Row index (y axis), 0-based.
    pub row: i32,
    /// Column index (x axis), 0-based.
    pub col: i32,
}

impl Region {
    /// Sentinel for entities held in the overflow set.
    pub const OVERFLOW: Region = Region { row: -1, col: -1 };

    /// Creates a region from row/column indices.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns `true` if this is the overflow sentinel.
    #[must_use]
    pub const fn is_overflow(self) -> bool {
        self.row < 0 || self.col < 0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_overflow() {
            write!(f, "overflow")
        } else {
            write!(f, "({}, {})", self.row, self.col)
        }
    }
}
