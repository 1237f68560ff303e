//! Entity records, identifiers, and the capability table.
//!
//! Every object in the arena (players, obstacles, pickups) is the same
//! uniform [`Entity`] record: a position, a vertical plane, an orientation,
//! a bounding extent, health/shield pools, and a set of capability flags.
//! What an entity *is* is a closed [`EntityKind`] enumeration; what it *can
//! do* is the [`Caps`] bitset seeded from a per-kind default table. Gameplay
//! code branches on capabilities, never on runtime type inspection.
//!
//! Identifiers come from an [`IdAllocator`], an explicitly owned atomic
//! counter injected at construction so tests can seed it deterministically.
//!
//! # Lifecycle
//!
//! Entities are created by world generation or dropped during play. They are
//! never destroyed: when health reaches zero they are marked dead by that
//! very fact (`health == 0`) and excluded from queries and combat.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use cellmap::{Rect, Spatial};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::weapon::{ItemKind, Loadout};

/// Default bounding extent for players.
pub const PLAYER_EXTENT: Vec2 = Vec2::new(16.0, 16.0);
/// Default bounding extent for dropped/world items.
pub const ITEM_EXTENT: Vec2 = Vec2::new(8.0, 8.0);
/// Default player health pool.
pub const PLAYER_HEALTH: f32 = 100.0;
/// Default player shield capacity (starts empty).
pub const PLAYER_SHIELD_CAP: f32 = 50.0;
/// Default obstacle health pool.
pub const OBSTACLE_HEALTH: f32 = 150.0;

/// Unique identifier for an entity.
///
/// Newtype around `u64`; immutable once assigned, ordered by numeric value.
/// The ordering is load-bearing: it pins bucket iteration in the spatial
/// index and tie-breaks among equally-near attack targets.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Monotonically increasing id source.
///
/// Owned and injected rather than process-global, so a test can start a fresh
/// allocator (optionally seeded) and get reproducible ids. Sharing one
/// allocator across threads is safe; allocation is a single atomic increment.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator starting at id 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first id is `start`.
    #[must_use]
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Allocates the next id.
    pub fn allocate(&self) -> EntityId {
        EntityId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

bitflags! {
    /// Capability flags controlling how gameplay rules treat an entity.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Caps: u8 {
        /// Can move under its own action (players).
        const MOBILE = 1 << 0;
        /// Takes damage from attacks and the hazard ring.
        const DAMAGEABLE = 1 << 1;
        /// Blocks movement; eligible to obstruct attack rays.
        const SOLID = 1 << 2;
        /// Can be acquired via pickup; excluded from attack resolution and
        /// movement collision.
        const ACQUIRABLE = 1 << 3;
        /// See-through hint for the presentation and AI layers; carries no
        /// weight in core movement or attack rules.
        const TRANSPARENT = 1 << 4;
    }
}

/// Closed classification of everything the arena can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A combatant with a loadout and a kill counter.
    Player,
    /// Static world geometry (walls, crates, wrecks).
    Obstacle,
    /// An acquirable item lying in the world.
    Pickup,
}

impl EntityKind {
    /// Default capability table for this kind. Individual entities may
    /// override the result at creation.
    #[must_use]
    pub const fn default_caps(self) -> Caps {
        match self {
            Self::Player => Caps::MOBILE
                .union(Caps::DAMAGEABLE)
                .union(Caps::SOLID),
            Self::Obstacle => Caps::DAMAGEABLE.union(Caps::SOLID),
            Self::Pickup => Caps::ACQUIRABLE,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Obstacle => write!(f, "Obstacle"),
            Self::Pickup => write!(f, "Pickup"),
        }
    }
}

/// Vertical plane an entity currently occupies.
///
/// The world is 2D; the "Z axis" collapses to this flag. Airborne players
/// (still descending at match start) cannot pick up items or attack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Plane {
    /// On the ground, fully participating.
    #[default]
    Ground,
    /// Above the arena, not yet landed.
    Airborne,
}

/// A mutable entity record.
///
/// Positions and extents are bounding-box approximations; health and shield
/// are clamped at zero and at their respective caps. The orientation heading
/// is kept normalized to `[0, 360)` degrees by its setter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    /// Center position in world coordinates.
    pub pos: Vec2,
    /// Vertical plane.
    pub plane: Plane,
    heading: f32,
    /// Bounding width/height.
    pub extent: Vec2,
    health: f32,
    max_health: f32,
    shield: f32,
    max_shield: f32,
    /// Capability flags.
    pub caps: Caps,
    /// Payload for pickups; consumed on a successful acquire.
    pub item: Option<ItemKind>,
    /// Weapon slots, ammo reserve, and kill counter; players only.
    pub loadout: Option<Loadout>,
}

impl Entity {
    /// Creates an entity of the given kind with the kind's default
    /// capabilities and empty pools.
    #[must_use]
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, extent: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            plane: Plane::Ground,
            heading: 0.0,
            extent,
            health: 1.0,
            max_health: 1.0,
            shield: 0.0,
            max_shield: 0.0,
            caps: kind.default_caps(),
            item: None,
            loadout: None,
        }
    }

    /// Creates a player at `pos` with default pools and an empty loadout.
    #[must_use]
    pub fn player(id: EntityId, pos: Vec2) -> Self {
        let mut entity = Self::new(id, EntityKind::Player, pos, PLAYER_EXTENT);
        entity.health = PLAYER_HEALTH;
        entity.max_health = PLAYER_HEALTH;
        entity.max_shield = PLAYER_SHIELD_CAP;
        entity.loadout = Some(Loadout::default());
        entity
    }

    /// Creates a solid, damageable obstacle covering `extent` at `pos`.
    #[must_use]
    pub fn obstacle(id: EntityId, pos: Vec2, extent: Vec2) -> Self {
        let mut entity = Self::new(id, EntityKind::Obstacle, pos, extent);
        entity.health = OBSTACLE_HEALTH;
        entity.max_health = OBSTACLE_HEALTH;
        entity
    }

    /// Creates a world pickup carrying `item` at `pos`.
    #[must_use]
    pub fn pickup(id: EntityId, pos: Vec2, item: ItemKind) -> Self {
        let mut entity = Self::new(id, EntityKind::Pickup, pos, ITEM_EXTENT);
        entity.item = Some(item);
        entity
    }

    /// Replaces the capability set.
    #[must_use]
    pub fn with_caps(mut self, caps: Caps) -> Self {
        self.caps = caps;
        self
    }

    /// Sets the vertical plane.
    #[must_use]
    pub fn with_plane(mut self, plane: Plane) -> Self {
        self.plane = plane;
        self
    }

    /// Sets the orientation heading (normalized).
    #[must_use]
    pub fn with_heading(mut self, degrees: f32) -> Self {
        self.set_heading(degrees);
        self
    }

    /// The immutable identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// The entity kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Orientation in degrees, always in `[0, 360)`.
    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.heading
    }

    /// Sets the orientation, normalizing any input angle into `[0, 360)`.
    pub fn set_heading(&mut self, degrees: f32) {
        self.heading = degrees.rem_euclid(360.0);
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Current shield charge.
    #[must_use]
    pub const fn shield(&self) -> f32 {
        self.shield
    }

    /// Maximum health pool.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// A live entity participates in queries and combat; a dead one is
    /// excluded everywhere but never deallocated.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Convenience capability check.
    #[must_use]
    pub const fn has(&self, caps: Caps) -> bool {
        self.caps.contains(caps)
    }

    /// Applies `amount` damage, shield first, clamping both pools at zero.
    ///
    /// Returns `true` exactly when this call transitioned the entity from
    /// alive to dead, so a caller holding the entity lock can emit a single
    /// death notification even under concurrent damage sources.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
        self.health == 0.0
    }

    /// Restores health up to the maximum. Returns the amount actually
    /// applied.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let applied = amount.min(self.max_health - self.health);
        self.health += applied;
        applied
    }

    /// Charges the shield up to its capacity. Returns the amount actually
    /// applied.
    pub fn charge_shield(&mut self, amount: f32) -> f32 {
        let applied = amount.min(self.max_shield - self.shield);
        self.shield += applied;
        applied
    }

    /// Bounding rectangle at the current position.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, self.extent)
    }
}

impl Spatial for Entity {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn extent(&self) -> Vec2 {
        self.extent
    }
}
