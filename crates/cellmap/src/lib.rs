//! # Cellmap
//!
//! Grid-partitioned spatial index for large 2D arenas.
//!
//! Cellmap divides an arena into fixed-size square cells and buckets entities
//! by the cell their position falls into. Entities whose bounding box exceeds
//! the cell size, or whose position maps outside the grid, live in a separate
//! *overflow* set that every range query includes unconditionally. This keeps
//! "what is near rectangle R" sub-linear for the common case (small, in-bounds
//! entities) without ever producing a false negative for the awkward ones
//! (arena-spanning walls, out-of-bounds stragglers).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cellmap::{GridIndex, Shared, Spatial};
//!
//! let index: GridIndex<u64, Thing> = GridIndex::new(1000.0, 1000.0, &seed);
//! index.insert(7, thing.clone());
//!
//! // Conservative superset of everything near the rectangle
//! for hit in index.query(100.0, 100.0, 300.0, 300.0) {
//!     let thing = hit.read();
//!     // exact filtering is the caller's job
//! }
//! ```
//!
//! ## Concurrency
//!
//! Each index owns a single shared-read / exclusive-write lock. Any number of
//! queries proceed concurrently; `insert`/`remove`/`relocate` serialize
//! against readers and each other. Stored values are `Arc<RwLock<T>>` handles
//! so callers can mutate entities without going through the index; the index
//! itself never locks an entity while holding its own lock.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod grid;
pub mod region;

// Re-exports for convenience
pub use grid::{GridIndex, GridStats};
pub use region::Region;

use std::sync::Arc;

use glam::Vec2;
use parking_lot::RwLock;

/// Shared, internally synchronized handle to an entity.
///
/// The grid stores these handles rather than owning entities outright: the
/// arena layer and a background hazard thread both mutate entity state, and
/// the per-entity lock keeps that sound without funneling every field write
/// through the index.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wraps a value in a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Access to the spatial footprint of a stored entity.
///
/// The index derives an entity's bucket from its *current* position and
/// bounding extent, so these must reflect live state.
pub trait Spatial {
    /// Center position of the entity.
    fn position(&self) -> Vec2;

    /// Bounding width/height of the entity.
    fn extent(&self) -> Vec2;

    /// Axis-aligned bounding rectangle, centered on the position.
    fn rect(&self) -> Rect {
        Rect::from_center(self.position(), self.extent())
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from min/max corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from a center point and a size.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Create a rectangle from two arbitrary corners, normalizing a reversed
    /// pair so that `min <= max` holds componentwise.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Get the center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the rectangle.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Check if a point is inside the rectangle (inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Check if this rectangle intersects another (inclusive of touching
    /// edges).
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}
