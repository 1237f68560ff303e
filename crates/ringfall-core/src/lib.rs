//! # Ringfall Core
//!
//! Simulation kernel for Ringfall, a top-down last-player-standing shooter.
//!
//! This crate is the authoritative rules engine: it tracks every entity
//! (players, obstacles, pickups) in a large 2D arena, validates and applies
//! movement, resolves ranged and melee attacks against the nearest
//! obstructing target, and runs the shrinking hazard ring that forces the
//! match to an end.
//!
//! ## Architecture
//!
//! - **Entities** ([`entity`]): uniform mutable records with a closed kind
//!   enumeration and a capability table; no runtime type inspection.
//! - **Arena** ([`arena`]): two [`cellmap::GridIndex`] instances (solids and
//!   pickups) plus the per-action rules: movement validation, pickup/drop,
//!   attack resolution, hazard damage.
//! - **Hazard ring** ([`hazard`]): a Paused/Shrinking state machine advanced
//!   by a periodically firing background thread that contends for the same
//!   index locks as foreground actions.
//! - **Events** ([`event`]): transient notifications (trajectories, hits,
//!   deaths, kill messages) consumed by rendering and audio, which are
//!   otherwise outside this crate.
//!
//! Rendering, bot decision logic, world generation, and the input shell are
//! external collaborators: world generation supplies the initial entity set,
//! the input/AI layers call [`arena::Arena`] operations and branch on the
//! returned outcome codes, and rendering consumes
//! [`arena::Arena::within_window`] plus the event sink.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ringfall_core::{Arena, ArenaConfig, HazardTicker};
//!
//! let arena = Arc::new(Arena::new(config, players, obstacles, items, allocator, sink)?);
//! let _ticker = HazardTicker::spawn(Arc::clone(&arena), Duration::from_millis(500));
//!
//! if arena.move_player(&player, 0.0, -1.0) {
//!     // position applied, index relocated if the region changed
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export cellmap for spatial queries
pub use cellmap;

pub mod arena;
pub mod combat;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod hazard;
pub mod spawn;
pub mod weapon;

pub use arena::{Arena, AttackOutcome};
pub use config::ArenaConfig;
pub use entity::{Caps, Entity, EntityId, EntityKind, IdAllocator, Plane};
pub use error::ConfigError;
pub use event::{ArenaEvent, CollectingSink, EventSink, NullSink};
pub use hazard::{HazardConfig, HazardPhase, HazardTicker, HazardZone};
pub use weapon::{FireAction, ItemCategory, ItemKind, Loadout, ReloadOutcome, Weapon, WeaponKind};

#[cfg(test)]
mod tests;
