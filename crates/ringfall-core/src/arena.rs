//! The arena: entity population plus the per-action gameplay rules.
//!
//! An [`Arena`] owns two spatial indices over the same uniform entity type:
//! `solids` (players and obstacles, the things movement and rays care about)
//! and `items` (acquirable pickups). Actions take `&self`; interior locks
//! keep concurrent callers and the hazard ticker consistent.
//!
//! # Locking
//!
//! Per-entity state lives behind `Shared<Entity>` read/write locks; each
//! index has its own internal lock. The ordering rule is: an entity lock is
//! never held across an index operation that takes the index lock with an
//! entity read (insert), and attack resolution snapshots the shooter before
//! casting rays so the shooter can appear in its own candidate list without
//! self-deadlock.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cellmap::{GridIndex, Rect, Shared};
use glam::Vec2;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::combat::{self, nearest_hit};
use crate::config::ArenaConfig;
use crate::entity::{Caps, Entity, EntityId, EntityKind, IdAllocator, Plane};
use crate::error::ConfigError;
use crate::event::{ArenaEvent, EventSink};
use crate::hazard::HazardZone;
use crate::weapon::{FireAction, ItemCategory, ItemKind, ReloadOutcome, MELEE_DAMAGE, MELEE_RANGE};

/// Slack on the move-request magnitude check, absorbing float error in
/// callers that normalize their direction vectors.
const MOVE_NORM_LIMIT: f32 = 1.000_01;

/// What an attack request accomplished.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Nothing happened (dead, airborne, paused, or empty magazine).
    None,
    /// A round was spent; no ray connected.
    Fired,
    /// A round was spent and at least one target was struck.
    FiredContact,
    /// A round was spent and at least one target died.
    FiredKill,
    /// A bare-handed swing that connected with nothing.
    Melee,
    /// A bare-handed swing that struck a target.
    MeleeContact,
    /// A bare-handed swing that killed a target.
    MeleeKill,
}

struct RayPlan {
    headings: Vec<f32>,
    damage: f32,
    range: f32,
    melee: bool,
}

/// The authoritative game state and rules.
pub struct Arena {
    config: ArenaConfig,
    solids: GridIndex<EntityId, Entity>,
    items: GridIndex<EntityId, Entity>,
    players: Vec<Shared<Entity>>,
    hazard: Mutex<HazardZone>,
    paused: AtomicBool,
    allocator: Arc<IdAllocator>,
    events: Arc<dyn EventSink>,
}

impl Arena {
    /// Builds an arena from its initial population.
    ///
    /// Players and obstacles share the `solids` index; `items` get their
    /// own. The player roster is retained separately so hazard ticks and
    /// win-condition checks never scan world geometry.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDimensions`] for a non-positive arena, and
    /// [`ConfigError::SpawnObstructed`] when an initial player overlaps
    /// solid geometry.
    pub fn new(
        config: ArenaConfig,
        players: Vec<Shared<Entity>>,
        obstacles: Vec<Shared<Entity>>,
        items: Vec<Shared<Entity>>,
        allocator: Arc<IdAllocator>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        if config.width <= 0.0 || config.height <= 0.0 {
            return Err(ConfigError::InvalidDimensions {
                width: config.width,
                height: config.height,
            });
        }

        for player in &players {
            let bounds = player.read().bounds();
            for obstacle in &obstacles {
                let obstacle = obstacle.read();
                if obstacle.has(Caps::SOLID) && obstacle.bounds().intersects(&bounds) {
                    return Err(ConfigError::SpawnObstructed {
                        id: player.read().id(),
                    });
                }
            }
        }

        let solid_seed: Vec<_> = obstacles
            .iter()
            .chain(players.iter())
            .map(|handle| (handle.read().id(), Arc::clone(handle)))
            .collect();
        let item_seed: Vec<_> = items
            .iter()
            .map(|handle| (handle.read().id(), Arc::clone(handle)))
            .collect();

        let hazard = HazardZone::new(config.hazard.clone());
        Ok(Self {
            solids: GridIndex::new(config.width, config.height, &solid_seed),
            items: GridIndex::new(config.width, config.height, &item_seed),
            players,
            hazard: Mutex::new(hazard),
            paused: AtomicBool::new(false),
            allocator,
            events,
            config,
        })
    }

    /// The arena configuration.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The player roster.
    #[must_use]
    pub fn players(&self) -> &[Shared<Entity>] {
        &self.players
    }

    /// A point-in-time copy of the hazard ring.
    #[must_use]
    pub fn hazard_snapshot(&self) -> HazardZone {
        self.hazard.lock().clone()
    }

    /// Number of live players.
    #[must_use]
    pub fn live_players(&self) -> usize {
        self.players.iter().filter(|p| p.read().is_alive()).count()
    }

    // ========================================================================
    // Pause control
    // ========================================================================

    /// Freezes movement, combat, pickups, and hazard ticks.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    /// Resumes after [`Arena::pause`].
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    /// Whether the arena is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Every live entity whose bounds intersect the `w` by `h` window
    /// centered at `(x, y)`. Exact: the grid's conservative candidate set is
    /// filtered against the window rectangle.
    #[must_use]
    pub fn within_window(&self, x: f32, y: f32, w: f32, h: f32) -> Vec<Shared<Entity>> {
        let window = Rect::from_center(Vec2::new(x, y), Vec2::new(w, h));
        let mut visible = Vec::new();
        for index in [&self.solids, &self.items] {
            for handle in index.query(window.min.x, window.min.y, window.max.x, window.max.y) {
                let keep = {
                    let entity = handle.read();
                    entity.is_alive() && entity.bounds().intersects(&window)
                };
                if keep {
                    visible.push(handle);
                }
            }
        }
        visible
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Applies a move request `(dx, dy)` scaled by the effective step
    /// length. Returns `false`, leaving the position untouched, when the
    /// arena is paused, the entity is dead or immobile, the request's L1
    /// magnitude exceeds 1, or the destination collides with solid geometry.
    pub fn move_player(&self, player: &Shared<Entity>, dx: f32, dy: f32) -> bool {
        if self.is_paused() {
            return false;
        }
        if dx.abs() + dy.abs() > MOVE_NORM_LIMIT {
            debug!(dx, dy, "rejected over-unit move request");
            return false;
        }

        let (pos, extent) = {
            let entity = player.read();
            if !entity.is_alive() || !entity.has(Caps::MOBILE) {
                return false;
            }
            (entity.pos, entity.extent)
        };

        let pace = self.hazard.lock().pace_at(pos);
        let step = self.config.effective_step(pace);
        let target = pos + Vec2::new(dx, dy) * step;
        let half = extent / 2.0;
        let target = Vec2::new(
            target.x.clamp(half.x, self.config.width - half.x),
            target.y.clamp(half.y, self.config.height - half.y),
        );
        let footprint = Rect::from_center(target, extent);

        for handle in
            self.solids
                .query(footprint.min.x, footprint.min.y, footprint.max.x, footprint.max.y)
        {
            if Arc::ptr_eq(&handle, player) {
                continue;
            }
            let other = handle.read();
            if other.is_alive()
                && other.has(Caps::SOLID)
                && !other.has(Caps::ACQUIRABLE)
                && other.bounds().intersects(&footprint)
            {
                return false;
            }
        }

        // The write guard is held across the relocate so a concurrent move of
        // the same player cannot interleave between the position update and
        // the bucket change.
        let mut entity = player.write();
        let src = self.solids.region_for(entity.pos, entity.extent);
        entity.pos = target;
        let dst = self.solids.region_for(target, extent);
        if src != dst {
            self.solids.relocate(entity.id(), src, dst);
        }
        true
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Acquires the item under the player, if any: the overlapping
    /// acquirable with the lowest id is removed from the world and merged
    /// into the player. Returns the merged item's category, or `None` when
    /// nothing was acquired.
    ///
    /// A payload the player cannot use (full weapon slots, capped ammo,
    /// full health or shield) is discarded with the pickup; the item does
    /// not return to the ground.
    pub fn pickup(&self, player: &Shared<Entity>) -> Option<ItemCategory> {
        if self.is_paused() {
            return None;
        }
        let (pos, extent) = {
            let entity = player.read();
            if !entity.is_alive() || entity.plane != Plane::Ground {
                return None;
            }
            (entity.pos, entity.extent)
        };
        let footprint = Rect::from_center(pos, extent);

        let mut candidates: Vec<(EntityId, Shared<Entity>)> = Vec::new();
        for handle in
            self.items
                .query(footprint.min.x, footprint.min.y, footprint.max.x, footprint.max.y)
        {
            let entity = handle.read();
            if entity.has(Caps::ACQUIRABLE) && entity.bounds().intersects(&footprint) {
                candidates.push((entity.id(), Arc::clone(&handle)));
            }
        }
        candidates.sort_by_key(|(id, _)| *id);

        for (id, handle) in candidates {
            // Another picker may win the race; remove() arbitrates.
            if !self.items.remove(id, &handle) {
                continue;
            }
            let Some(payload) = handle.write().item.take() else {
                warn!(%id, "acquirable entity had no payload");
                return None;
            };
            let category = payload.category();
            let merged = Self::merge_item(&mut player.write(), payload);
            if merged.is_none() {
                debug!(%id, ?category, "pickup payload discarded, player cannot use it");
            }
            return merged;
        }
        None
    }

    fn merge_item(player: &mut Entity, item: ItemKind) -> Option<ItemCategory> {
        match item {
            ItemKind::Weapon(weapon) => {
                let loadout = player.loadout.as_mut()?;
                loadout.equip(weapon).ok()?;
                Some(ItemCategory::Weapon)
            }
            ItemKind::Ammo { rounds } => {
                let loadout = player.loadout.as_mut()?;
                loadout.stash_ammo(rounds).then_some(ItemCategory::Ammo)
            }
            ItemKind::Medkit { heal } => (player.heal(heal) > 0.0).then_some(ItemCategory::Health),
            ItemKind::ShieldCell { charge } => {
                (player.charge_shield(charge) > 0.0).then_some(ItemCategory::Shield)
            }
        }
    }

    /// Drops the player's active weapon at their feet as a world pickup.
    /// Returns `false` when there is nothing to drop.
    pub fn drop_weapon(&self, player: &Shared<Entity>) -> bool {
        if self.is_paused() {
            return false;
        }
        let (weapon, pos) = {
            let mut entity = player.write();
            if !entity.is_alive() {
                return false;
            }
            let Some(weapon) = entity.loadout.as_mut().and_then(|l| l.unequip()) else {
                return false;
            };
            (weapon, entity.pos)
        };

        let id = self.allocator.allocate();
        let item = Entity::pickup(id, pos, ItemKind::Weapon(weapon));
        self.items.insert(id, cellmap::shared(item));
        true
    }

    /// Reloads the player's active weapon from their ammo reserve.
    pub fn reload(&self, player: &Shared<Entity>) -> ReloadOutcome {
        if self.is_paused() {
            return ReloadOutcome::NoWeapon;
        }
        let mut entity = player.write();
        if !entity.is_alive() {
            return ReloadOutcome::NoWeapon;
        }
        let Some(loadout) = entity.loadout.as_mut() else {
            return ReloadOutcome::NoWeapon;
        };
        let reserve = &mut loadout.reserve_ammo;
        match loadout.primary.as_mut().or(loadout.secondary.as_mut()) {
            Some(weapon) => weapon.reload_from(reserve),
            None => ReloadOutcome::NoWeapon,
        }
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// Fires the player's active weapon along their heading, or swings
    /// bare-handed when no weapon is equipped.
    ///
    /// Zero-spread weapons cast one ray; spread weapons cast three (center
    /// and both fan edges), each dealing full per-ray damage, so a tight
    /// target can be struck more than once. Rays stop at the nearest live
    /// solid damageable target; a trajectory event is emitted per ranged
    /// ray, one hit event per distinct target, and a death plus kill-feed
    /// event per kill.
    pub fn attack(&self, player: &Shared<Entity>) -> AttackOutcome {
        if self.is_paused() {
            return AttackOutcome::None;
        }

        let (shooter_id, origin, heading, samples, plan) = {
            let mut entity = player.write();
            if !entity.is_alive() || entity.plane != Plane::Ground {
                return AttackOutcome::None;
            }
            let action = match entity.loadout.as_mut().and_then(|l| l.current_weapon_mut()) {
                Some(weapon) => weapon.fire(),
                None => FireAction::Melee {
                    damage: MELEE_DAMAGE,
                    range: MELEE_RANGE,
                },
            };
            let plan = match action {
                FireAction::Blocked => return AttackOutcome::None,
                FireAction::Ranged {
                    damage,
                    range,
                    spread,
                } => RayPlan {
                    headings: if spread == 0.0 {
                        vec![entity.heading()]
                    } else {
                        vec![
                            entity.heading(),
                            entity.heading() - spread / 2.0,
                            entity.heading() + spread / 2.0,
                        ]
                    },
                    damage,
                    range,
                    melee: false,
                },
                FireAction::Melee { damage, range } => RayPlan {
                    headings: vec![entity.heading()],
                    damage,
                    range,
                    melee: true,
                },
            };
            (
                entity.id(),
                entity.pos,
                entity.heading(),
                combat::sample_points(entity.pos, entity.extent),
                plan,
            )
        };
        debug!(%shooter_id, heading, melee = plan.melee, rays = plan.headings.len(), "attack");

        let mut struck: BTreeSet<EntityId> = BTreeSet::new();
        let mut deaths: Vec<(EntityId, Vec2, EntityKind)> = Vec::new();

        for ray_heading in &plan.headings {
            let full_end = combat::ray_endpoint(origin, *ray_heading, plan.range);
            let hit = nearest_hit(shooter_id, &samples, origin, full_end, &self.solids);

            let end = match &hit {
                Some(hit) if hit.distance < plan.range => {
                    combat::ray_endpoint(origin, *ray_heading, hit.distance)
                }
                _ => full_end,
            };
            if !plan.melee {
                self.events.notify(ArenaEvent::Trajectory {
                    from: origin,
                    to: end,
                });
            }

            if let Some(hit) = hit {
                let mut target = hit.handle.write();
                if target.is_alive() {
                    struck.insert(hit.id);
                    if target.apply_damage(plan.damage) {
                        deaths.push((hit.id, target.pos, target.kind()));
                    }
                }
            }
        }

        for target in &struck {
            self.events.notify(ArenaEvent::Hit {
                target: *target,
                attacker: shooter_id,
            });
        }

        for (victim, pos, kind) in &deaths {
            self.events.notify(ArenaEvent::Died {
                entity: *victim,
                killer: Some(shooter_id),
            });
            self.events.notify(ArenaEvent::KillMessage {
                text: format!("{kind} {victim} eliminated by {shooter_id}"),
                pos: *pos,
            });
            if *kind == EntityKind::Player {
                if let Some(loadout) = player.write().loadout.as_mut() {
                    loadout.record_kill();
                }
            }
        }

        match (plan.melee, !deaths.is_empty(), !struck.is_empty()) {
            (false, true, _) => AttackOutcome::FiredKill,
            (false, false, true) => AttackOutcome::FiredContact,
            (false, false, false) => AttackOutcome::Fired,
            (true, true, _) => AttackOutcome::MeleeKill,
            (true, false, true) => AttackOutcome::MeleeContact,
            (true, false, false) => AttackOutcome::Melee,
        }
    }

    // ========================================================================
    // Hazard
    // ========================================================================

    /// Advances the hazard ring one tick and applies positional damage to
    /// every live player. Skipped entirely while paused. Driven by
    /// [`crate::HazardTicker`], but callable directly for deterministic
    /// tests.
    pub fn hazard_tick(&self) {
        if self.is_paused() {
            return;
        }
        let zone = {
            let mut zone = self.hazard.lock();
            zone.advance();
            zone.clone()
        };

        for player in &self.players {
            let (id, amount, died, pos) = {
                let mut entity = player.write();
                if !entity.is_alive() {
                    continue;
                }
                let amount = zone.damage_at(entity.pos);
                if amount <= 0.0 {
                    continue;
                }
                let died = entity.apply_damage(amount);
                (entity.id(), amount, died, entity.pos)
            };

            self.events.notify(ArenaEvent::HazardDamage { player: id, amount });
            if died {
                self.events.notify(ArenaEvent::Died {
                    entity: id,
                    killer: None,
                });
                self.events.notify(ArenaEvent::KillMessage {
                    text: format!("Player {id} succumbed to the hazard ring"),
                    pos,
                });
            }
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("players", &self.players.len())
            .field("solids", &self.solids.len())
            .field("items", &self.items.len())
            .field("paused", &self.is_paused())
            .finish()
    }
}
