//! Initial placement helpers.
//!
//! World generation owns the entity roster; this module only answers "where
//! can they stand". [`scatter_spawns`] draws random positions, rejecting any
//! that crowd an earlier slot or overlap solid geometry, and gives up with a
//! descriptive error rather than looping forever on an overfull map.

use cellmap::{Rect, Shared};
use glam::Vec2;
use rand::Rng;
use tracing::warn;

use crate::entity::{Caps, Entity};
use crate::error::ConfigError;

/// Attempts per slot before the scatterer gives up.
const ATTEMPTS_PER_SLOT: usize = 64;
/// Minimum center distance between two spawn slots.
const SLOT_SPACING: f32 = 48.0;

/// Picks `count` clear positions inside a `width` by `height` arena.
///
/// A position is clear when a `clearance`-sized box centered on it overlaps
/// no solid entity in `obstacles` and it keeps [`SLOT_SPACING`] distance from
/// every slot already placed.
///
/// # Errors
///
/// [`ConfigError::InsufficientSpawnSlots`] when the retry budget runs out
/// before `count` slots are found.
pub fn scatter_spawns<R: Rng>(
    rng: &mut R,
    count: usize,
    width: f32,
    height: f32,
    clearance: Vec2,
    obstacles: &[Shared<Entity>],
) -> Result<Vec<Vec2>, ConfigError> {
    let margin = clearance / 2.0;
    let mut slots: Vec<Vec2> = Vec::with_capacity(count);

    'slots: while slots.len() < count {
        for _ in 0..ATTEMPTS_PER_SLOT {
            let pos = Vec2::new(
                rng.gen_range(margin.x..=width - margin.x),
                rng.gen_range(margin.y..=height - margin.y),
            );
            if is_clear(pos, clearance, &slots, obstacles) {
                slots.push(pos);
                continue 'slots;
            }
        }
        warn!(
            requested = count,
            found = slots.len(),
            "spawn scatter exhausted its retry budget"
        );
        return Err(ConfigError::InsufficientSpawnSlots {
            requested: count,
            found: slots.len(),
        });
    }
    Ok(slots)
}

fn is_clear(pos: Vec2, clearance: Vec2, taken: &[Vec2], obstacles: &[Shared<Entity>]) -> bool {
    if taken.iter().any(|slot| slot.distance(pos) < SLOT_SPACING) {
        return false;
    }
    let footprint = Rect::from_center(pos, clearance);
    !obstacles.iter().any(|handle| {
        let entity = handle.read();
        entity.has(Caps::SOLID) && entity.bounds().intersects(&footprint)
    })
}
