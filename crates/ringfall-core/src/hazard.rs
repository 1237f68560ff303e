//! The shrinking hazard ring.
//!
//! A circular safe zone alternates between a [`HazardPhase::Paused`] hold and
//! a [`HazardPhase::Shrinking`] contraction, closing toward a floor diameter
//! it never passes. Players outside the safe circle move at a different pace
//! and take damage that grows with their distance from the edge.
//!
//! The zone itself is passive state; [`HazardTicker`] drives it from a
//! background thread by calling [`crate::Arena::hazard_tick`] on a fixed
//! period. The ticker contends for the same locks as foreground actions, so
//! the arena snapshots zone state before touching any entity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arena::Arena;

/// Tuning for the hazard ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardConfig {
    /// Center of the safe circle, fixed for the whole match.
    pub center: Vec2,
    /// Starting diameter.
    pub initial_diameter: f32,
    /// The diameter never shrinks below this.
    pub floor_diameter: f32,
    /// Diameter lost per tick while shrinking.
    pub shrink_per_tick: f32,
    /// Ticks spent holding between contractions.
    pub pause_ticks: u32,
    /// Ticks spent contracting before the next hold.
    pub shrink_ticks: u32,
    /// Flat damage per tick for any player outside the safe circle.
    pub base_damage: f32,
    /// Extra damage per world unit of distance beyond the safe edge.
    pub damage_per_distance: f32,
    /// Pace multiplier applied to players outside the safe circle.
    pub outside_pace: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            center: Vec2::new(500.0, 500.0),
            initial_diameter: 1400.0,
            floor_diameter: 100.0,
            shrink_per_tick: 10.0,
            pause_ticks: 20,
            shrink_ticks: 30,
            base_damage: 2.0,
            damage_per_distance: 0.01,
            outside_pace: 0.6,
        }
    }
}

/// The two phases of the ring's duty cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardPhase {
    /// Holding at the current diameter.
    Paused,
    /// Contracting toward the floor.
    Shrinking,
}

/// Current state of the hazard ring.
#[derive(Debug, Clone)]
pub struct HazardZone {
    config: HazardConfig,
    diameter: f32,
    phase: HazardPhase,
    ticks_in_phase: u32,
}

impl HazardZone {
    /// Creates a zone at the configured initial diameter, holding.
    #[must_use]
    pub fn new(config: HazardConfig) -> Self {
        let diameter = config.initial_diameter.max(config.floor_diameter);
        Self {
            config,
            diameter,
            phase: HazardPhase::Paused,
            ticks_in_phase: 0,
        }
    }

    /// Current diameter.
    #[must_use]
    pub const fn diameter(&self) -> f32 {
        self.diameter
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> HazardPhase {
        self.phase
    }

    /// Radius of the safe circle.
    #[must_use]
    pub fn safe_radius(&self) -> f32 {
        self.diameter / 2.0
    }

    /// Whether `pos` is inside the safe circle.
    #[must_use]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.distance(self.config.center) <= self.safe_radius()
    }

    /// Pace multiplier for a player at `pos`.
    #[must_use]
    pub fn pace_at(&self, pos: Vec2) -> f32 {
        if self.contains(pos) {
            1.0
        } else {
            self.config.outside_pace
        }
    }

    /// Damage per tick for a player at `pos`: zero inside the safe circle,
    /// otherwise a flat base plus a distance-scaled term.
    #[must_use]
    pub fn damage_at(&self, pos: Vec2) -> f32 {
        let excess = pos.distance(self.config.center) - self.safe_radius();
        if excess <= 0.0 {
            return 0.0;
        }
        self.config.base_damage + self.config.damage_per_distance * excess
    }

    /// Advances the duty cycle by one tick. The diameter only ever
    /// decreases, and never below the floor.
    pub fn advance(&mut self) {
        self.ticks_in_phase += 1;
        match self.phase {
            HazardPhase::Paused => {
                if self.ticks_in_phase >= self.config.pause_ticks {
                    self.phase = HazardPhase::Shrinking;
                    self.ticks_in_phase = 0;
                    info!(diameter = self.diameter, "hazard ring contracting");
                }
            }
            HazardPhase::Shrinking => {
                self.diameter =
                    (self.diameter - self.config.shrink_per_tick).max(self.config.floor_diameter);
                if self.ticks_in_phase >= self.config.shrink_ticks {
                    self.phase = HazardPhase::Paused;
                    self.ticks_in_phase = 0;
                    info!(diameter = self.diameter, "hazard ring holding");
                }
            }
        }
    }
}

/// Background thread that ticks the arena's hazard ring on a fixed period.
///
/// Stops (and joins) on [`HazardTicker::stop`] or on drop.
#[derive(Debug)]
pub struct HazardTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HazardTicker {
    /// Spawns the ticker thread.
    #[must_use]
    pub fn spawn(arena: Arc<Arena>, period: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            debug!(?period, "hazard ticker started");
            while !thread_stop.load(Ordering::Relaxed) {
                std::thread::sleep(period);
                if thread_stop.load(Ordering::Relaxed) {
                    break;
                }
                arena.hazard_tick();
            }
            debug!("hazard ticker stopped");
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signals the thread to stop and waits for it to exit.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HazardTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
