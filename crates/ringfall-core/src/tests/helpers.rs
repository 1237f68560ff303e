//! Shared factories for the integration scenarios.

use std::sync::Arc;

use cellmap::{shared, Shared};
use glam::Vec2;

use crate::{
    Arena, ArenaConfig, CollectingSink, Entity, HazardConfig, IdAllocator, Weapon, WeaponKind,
};

/// A built arena plus the handles a scenario needs to drive it.
pub struct World {
    pub arena: Arc<Arena>,
    pub sink: Arc<CollectingSink>,
    pub allocator: Arc<IdAllocator>,
}

/// A hazard ring so large it never touches anyone, for scenarios that are
/// not about the ring.
pub fn dormant_hazard() -> HazardConfig {
    HazardConfig {
        initial_diameter: 1_000_000.0,
        floor_diameter: 1_000_000.0,
        ..HazardConfig::default()
    }
}

/// The standard 1000 by 1000 test arena with a dormant hazard ring.
pub fn quiet_config() -> ArenaConfig {
    ArenaConfig {
        hazard: dormant_hazard(),
        ..ArenaConfig::default()
    }
}

/// Builds an arena over pre-made entities, collecting every event.
///
/// # Panics
///
/// Panics when construction fails; scenario setups are expected to be valid.
pub fn build_world(
    config: ArenaConfig,
    players: Vec<Shared<Entity>>,
    obstacles: Vec<Shared<Entity>>,
    items: Vec<Shared<Entity>>,
) -> World {
    let sink = Arc::new(CollectingSink::new());
    // Start runtime ids well above anything the scenarios hand-assign.
    let allocator = Arc::new(IdAllocator::starting_at(1000));
    let arena = Arena::new(
        config,
        players,
        obstacles,
        items,
        Arc::clone(&allocator),
        Arc::clone(&sink) as Arc<dyn crate::EventSink>,
    )
    .expect("scenario arena must build");
    World {
        arena: Arc::new(arena),
        sink,
        allocator,
    }
}

/// A player carrying a freshly built weapon of the given kind.
pub fn armed_player(id: u64, pos: Vec2, kind: WeaponKind) -> Shared<Entity> {
    let mut player = Entity::player(id.into(), pos);
    player
        .loadout
        .as_mut()
        .expect("players carry a loadout")
        .equip(Weapon::new(kind))
        .expect("fresh loadout has a free slot");
    shared(player)
}

/// An unarmed player.
pub fn bare_player(id: u64, pos: Vec2) -> Shared<Entity> {
    shared(Entity::player(id.into(), pos))
}

/// A solid, damageable wall centered at `pos`.
pub fn wall(id: u64, pos: Vec2, extent: Vec2) -> Shared<Entity> {
    shared(Entity::obstacle(id.into(), pos, extent))
}
