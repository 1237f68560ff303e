//! Transient gameplay notifications.
//!
//! The arena emits an [`ArenaEvent`] for every observable side effect of an
//! action: bullet trajectories, hit flashes, deaths, kill-feed messages, and
//! hazard damage. Events are fire-and-forget; the sink decides whether to
//! render, log, or drop them.

use glam::Vec2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// An observable side effect of an arena action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArenaEvent {
    /// A ray traveled from `from` to `to` (already truncated at the first
    /// obstruction or the weapon's range).
    Trajectory {
        /// Ray start.
        from: Vec2,
        /// Ray end.
        to: Vec2,
    },
    /// `target` was struck by `attacker`. Emitted once per attack per
    /// distinct target, even when several rays connect.
    Hit {
        /// The entity that was struck.
        target: EntityId,
        /// The entity that struck it.
        attacker: EntityId,
    },
    /// `entity` ran out of health. `killer` is absent for hazard deaths.
    Died {
        /// The entity that died.
        entity: EntityId,
        /// Who dealt the final blow, if anyone.
        killer: Option<EntityId>,
    },
    /// A kill-feed line anchored at a world position.
    KillMessage {
        /// Feed text.
        text: String,
        /// World position of the death.
        pos: Vec2,
    },
    /// The hazard ring damaged a player this tick.
    HazardDamage {
        /// The player damaged.
        player: EntityId,
        /// Damage applied.
        amount: f32,
    },
}

/// Receiver for arena events.
///
/// Implementations must be cheap and non-blocking; events are emitted while
/// the arena may still hold entity locks.
pub trait EventSink: Send + Sync {
    /// Delivers one event.
    fn notify(&self, event: ArenaEvent);
}

/// Discards every event. The default sink for headless simulation.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: ArenaEvent) {}
}

/// Buffers every event for later inspection. Intended for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ArenaEvent>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns everything collected so far.
    pub fn take(&self) -> Vec<ArenaEvent> {
        std::mem::take(&mut self.events.lock())
    }

    /// Clones the current buffer without draining it.
    #[must_use]
    pub fn events(&self) -> Vec<ArenaEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for CollectingSink {
    fn notify(&self, event: ArenaEvent) {
        self.events.lock().push(event);
    }
}
