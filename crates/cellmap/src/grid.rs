//! The grid index proper.
//!
//! `GridIndex` answers "which entities might overlap rectangle R" in better
//! than linear time while supporting concurrent readers and serialized
//! writers. Results are a conservative superset: callers that cannot tolerate
//! false positives apply an exact rectangle test afterwards.
//!
//! # Bucketing rules
//!
//! - Cell size is fixed at construction: the 80th percentile of the seed
//!   entities' larger bounding dimension, or the arena's larger dimension if
//!   the index starts empty. A mid-game churn of entity sizes never resizes
//!   the grid.
//! - Positions are rebased by an origin derived from the minimum X/Y among
//!   the seed entities, so negative world coordinates map into a valid
//!   non-negative row/column matrix.
//! - An entity whose bounding width or height exceeds the cell size, or whose
//!   rebased position falls outside the matrix, is held in the overflow set.
//!   Every query returns the whole overflow set unconditionally.
//!
//! # Lock discipline
//!
//! One `RwLock` guards the bucket structure. The index computes an entity's
//! region *before* taking its own lock and never locks an entity while
//! holding the grid lock, so entity locks and the grid lock cannot deadlock
//! against each other.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use parking_lot::RwLock;
use tracing::debug;

use crate::region::Region;
use crate::{Rect, Shared, Spatial};

/// Grid-partitioned spatial index with an overflow set.
///
/// Keyed by a caller-supplied id type `K` (ordered, so bucket iteration and
/// therefore query output is deterministic) and storing [`Shared`] handles to
/// entities implementing [`Spatial`].
///
/// # Ownership invariant
///
/// Every indexed entity is owned by exactly one bucket: one grid cell or the
/// overflow set, never both, never zero. `relocate` upholds this under a
/// single exclusive lock so no query observes a half-moved entity.
pub struct GridIndex<K, T> {
    /// Side length of a square cell, fixed for the index's lifetime.
    cell_size: f32,
    /// Rebasing origin; subtracted from positions before row/column math.
    origin: Vec2,
    /// Number of valid rows.
    rows: i32,
    /// Number of valid columns.
    cols: i32,
    /// Bucket structure, guarded by the single index lock.
    state: RwLock<GridState<K, T>>,
}

/// Mutable bucket structure behind the index lock.
struct GridState<K, T> {
    /// Occupied cells only; empty cells are not materialized.
    cells: BTreeMap<Region, BTreeMap<K, Shared<T>>>,
    /// Entities too large for any cell or outside the matrix.
    overflow: BTreeMap<K, Shared<T>>,
}

/// Occupancy snapshot, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStats {
    /// Number of cells currently holding at least one entity.
    pub occupied_cells: usize,
    /// Total entities held in cells.
    pub cell_entities: usize,
    /// Entities held in the overflow set.
    pub overflow_entities: usize,
}

impl<K, T> GridIndex<K, T>
where
    K: Copy + Ord + fmt::Debug,
    T: Spatial,
{
    /// Builds an index for an `arena_width` x `arena_height` world, seeded
    /// with the initial entity set.
    ///
    /// The seed determines the cell size (80th percentile of the larger
    /// bounding dimension) and the rebasing origin (componentwise minimum
    /// position). An empty seed yields a single cell covering the arena's
    /// larger dimension, anchored at the world origin.
    #[must_use]
    pub fn new(arena_width: f32, arena_height: f32, seed: &[(K, Shared<T>)]) -> Self {
        let fallback = arena_width.max(arena_height).max(1.0);

        let (cell_size, origin) = if seed.is_empty() {
            (fallback, Vec2::ZERO)
        } else {
            let mut dims = Vec::with_capacity(seed.len());
            let mut origin = Vec2::new(f32::INFINITY, f32::INFINITY);
            for (_, handle) in seed {
                let entity = handle.read();
                let extent = entity.extent();
                dims.push(extent.x.max(extent.y));
                origin = origin.min(entity.position());
            }
            dims.sort_by(f32::total_cmp);
            // Nearest-rank 80th percentile.
            let rank = ((dims.len() as f32) * 0.8).ceil() as usize;
            let cell = dims[rank.saturating_sub(1)];
            let cell = if cell > 0.0 { cell } else { fallback };
            (cell, origin)
        };

        #[allow(clippy::cast_possible_truncation)]
        let rows = ((arena_height / cell_size).ceil() as i32).max(1);
        #[allow(clippy::cast_possible_truncation)]
        let cols = ((arena_width / cell_size).ceil() as i32).max(1);

        let index = Self {
            cell_size,
            origin,
            rows,
            cols,
            state: RwLock::new(GridState {
                cells: BTreeMap::new(),
                overflow: BTreeMap::new(),
            }),
        };

        for (id, handle) in seed {
            index.insert(*id, handle.clone());
        }

        debug!(
            cell_size,
            rows, cols, seeded = seed.len(),
            "grid index constructed"
        );
        index
    }

    /// The fixed cell side length.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions as (rows, columns).
    #[must_use]
    pub const fn dimensions(&self) -> (i32, i32) {
        (self.rows, self.cols)
    }

    /// World-space bounds of one cell. Mostly useful for asserting the
    /// region-containment invariant in tests.
    #[must_use]
    pub fn cell_rect(&self, region: Region) -> Rect {
        let min = self.origin
            + Vec2::new(
                region.col as f32 * self.cell_size,
                region.row as f32 * self.cell_size,
            );
        Rect::from_min_max(min, min + Vec2::splat(self.cell_size))
    }

    /// Region for a given position/extent pair under this index's bucketing
    /// rules. [`Region::OVERFLOW`] when oversized or out of range.
    #[must_use]
    pub fn region_for(&self, position: Vec2, extent: Vec2) -> Region {
        if extent.x > self.cell_size || extent.y > self.cell_size {
            return Region::OVERFLOW;
        }
        let rebased = position - self.origin;
        #[allow(clippy::cast_possible_truncation)]
        let col = (rebased.x / self.cell_size).floor() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let row = (rebased.y / self.cell_size).floor() as i32;
        if row < 0 || col < 0 || row >= self.rows || col >= self.cols {
            Region::OVERFLOW
        } else {
            Region::new(row, col)
        }
    }

    /// The entity's current region, or the overflow sentinel.
    #[must_use]
    pub fn region_of(&self, entity: &T) -> Region {
        self.region_for(entity.position(), entity.extent())
    }

    /// Inserts an entity, bucketing it by its current position and extent.
    ///
    /// Re-inserting an id replaces the previous handle in whatever bucket the
    /// *new* state maps to; callers relocating a live entity should use
    /// [`GridIndex::relocate`] instead.
    pub fn insert(&self, id: K, entity: Shared<T>) {
        let region = {
            let e = entity.read();
            self.region_for(e.position(), e.extent())
        };
        let mut state = self.state.write();
        if region.is_overflow() {
            state.overflow.insert(id, entity);
        } else {
            state.cells.entry(region).or_default().insert(id, entity);
        }
    }

    /// Removes an entity, deriving its owning bucket from its *current*
    /// position. Returns whether anything was removed.
    pub fn remove(&self, id: K, entity: &Shared<T>) -> bool {
        let region = {
            let e = entity.read();
            self.region_for(e.position(), e.extent())
        };
        let mut state = self.state.write();
        let removed = if region.is_overflow() {
            state.overflow.remove(&id).is_some()
        } else if let Some(cell) = state.cells.get_mut(&region) {
            let removed = cell.remove(&id).is_some();
            if cell.is_empty() {
                state.cells.remove(&region);
            }
            removed
        } else {
            false
        };
        if !removed {
            debug!(?id, %region, "remove found nothing in derived bucket");
        }
        removed
    }

    /// Relocates an entity between buckets under one exclusive lock, so no
    /// query observes an inconsistent intermediate state.
    ///
    /// When `src == dst` (the entity is and remains oversized, or stays in
    /// the same cell, or is out of range on both ends) this is a no-op: the
    /// entity already sits where the indexing rules say it must.
    ///
    /// # Panics
    ///
    /// Panics if the prior state contradicts `src` (e.g. `src` says overflow
    /// but the entity is not in the overflow set). That is an internal
    /// invariant violation, a programming-error signal, never an expected
    /// gameplay condition.
    pub fn relocate(&self, id: K, src: Region, dst: Region) {
        if src == dst {
            return;
        }
        let mut state = self.state.write();
        let entity = if src.is_overflow() {
            state.overflow.remove(&id).unwrap_or_else(|| {
                panic!("grid index corrupted: {id:?} expected in overflow, not found")
            })
        } else {
            let cell = state.cells.get_mut(&src).unwrap_or_else(|| {
                panic!("grid index corrupted: {id:?} expected in cell {src}, cell empty")
            });
            let entity = cell.remove(&id).unwrap_or_else(|| {
                panic!("grid index corrupted: {id:?} expected in cell {src}, not found")
            });
            if cell.is_empty() {
                state.cells.remove(&src);
            }
            entity
        };
        if dst.is_overflow() {
            state.overflow.insert(id, entity);
        } else {
            state.cells.entry(dst).or_default().insert(id, entity);
        }
        debug!(?id, %src, %dst, "relocated");
    }

    /// Conservative range query over the rectangle spanned by two corners
    /// (reversed corners are normalized).
    ///
    /// The covering cell range is expanded by one cell in every direction,
    /// since an entity's bounding box can cross into the rectangle from an
    /// adjacent cell even though its center lies outside, then clamped to the
    /// grid.
    /// Every overflow entity is always included. No false negatives; callers
    /// needing exactness apply their own rectangle test.
    ///
    /// The read lock is held only while the snapshot is collected; the
    /// returned handles are clones, safe to hold across later writes.
    #[must_use]
    pub fn query(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<Shared<T>> {
        let rect = Rect::from_corners(Vec2::new(x1, y1), Vec2::new(x2, y2));

        #[allow(clippy::cast_possible_truncation)]
        let col_lo = (((rect.min.x - self.origin.x) / self.cell_size).floor() as i32 - 1)
            .clamp(0, self.cols - 1);
        #[allow(clippy::cast_possible_truncation)]
        let col_hi = (((rect.max.x - self.origin.x) / self.cell_size).floor() as i32 + 1)
            .clamp(0, self.cols - 1);
        #[allow(clippy::cast_possible_truncation)]
        let row_lo = (((rect.min.y - self.origin.y) / self.cell_size).floor() as i32 - 1)
            .clamp(0, self.rows - 1);
        #[allow(clippy::cast_possible_truncation)]
        let row_hi = (((rect.max.y - self.origin.y) / self.cell_size).floor() as i32 + 1)
            .clamp(0, self.rows - 1);

        let state = self.state.read();
        let mut out = Vec::new();
        for (region, cell) in state.cells.range(Region::new(row_lo, col_lo)..=Region::new(row_hi, col_hi)) {
            if region.col < col_lo || region.col > col_hi {
                continue;
            }
            out.extend(cell.values().cloned());
        }
        out.extend(state.overflow.values().cloned());
        out
    }

    /// Total number of indexed entities (cells plus overflow).
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.cells.values().map(BTreeMap::len).sum::<usize>() + state.overflow.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> GridStats {
        let state = self.state.read();
        GridStats {
            occupied_cells: state.cells.len(),
            cell_entities: state.cells.values().map(BTreeMap::len).sum(),
            overflow_entities: state.overflow.len(),
        }
    }
}

impl<K, T> fmt::Debug for GridIndex<K, T>
where
    K: Copy + Ord + fmt::Debug,
    T: Spatial,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("GridIndex")
            .field("cell_size", &self.cell_size)
            .field("origin", &self.origin)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("stats", &stats)
            .finish()
    }
}
