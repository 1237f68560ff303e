//! Construction-time error types.

use thiserror::Error;

use crate::entity::EntityId;

/// Errors raised while building an arena or placing its initial population.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The spawn scatterer could not find enough clear positions.
    #[error("requested {requested} spawn slots but only found {found} clear positions")]
    InsufficientSpawnSlots {
        /// Slots the caller asked for.
        requested: usize,
        /// Slots actually placed.
        found: usize,
    },

    /// An initial player overlaps solid world geometry.
    #[error("spawn position for entity {id} overlaps solid geometry")]
    SpawnObstructed {
        /// The obstructed player.
        id: EntityId,
    },

    /// Arena dimensions must be strictly positive.
    #[error("invalid arena dimensions {width}x{height}")]
    InvalidDimensions {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
}
