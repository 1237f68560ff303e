//! Weapons, loadouts, and the item taxonomy.
//!
//! A [`Weapon`] is a small stat block (damage, range, spread, magazine). The
//! per-shot rules live in [`Weapon::fire`], which either spends a round and
//! yields a ranged [`FireAction`] or reports the magazine empty. Players
//! carry up to two weapons plus an ammo reserve in a [`Loadout`]; everything
//! that can lie on the ground is an [`ItemKind`].
//!
//! Melee is not a weapon: a player with no weapon equipped swings bare-handed
//! with the `MELEE_*` constants below.

use serde::{Deserialize, Serialize};

/// Damage of a bare-handed melee swing.
pub const MELEE_DAMAGE: f32 = 10.0;
/// Reach of a bare-handed melee swing.
pub const MELEE_RANGE: f32 = 32.0;
/// Maximum rounds a loadout's reserve can hold.
pub const RESERVE_CAP: u32 = 240;

/// The closed set of weapon archetypes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Low damage, medium range, small magazine.
    Pistol,
    /// High damage, long range, large magazine.
    Rifle,
    /// Short range, fires a three-ray spread.
    Shotgun,
}

/// An equippable ranged weapon.
///
/// `spread` is the total fan angle in degrees; zero means a single ray along
/// the shooter's heading, nonzero means three rays (center and both fan
/// edges).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Archetype.
    pub kind: WeaponKind,
    /// Damage applied per ray that connects.
    pub damage: f32,
    /// Maximum ray length.
    pub range: f32,
    /// Total fan angle in degrees; zero for single-ray weapons.
    pub spread: f32,
    /// Rounds currently loaded.
    pub magazine: u32,
    /// Magazine capacity.
    pub magazine_size: u32,
}

impl Weapon {
    /// Creates a weapon of the given archetype with a full magazine.
    #[must_use]
    pub fn new(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Pistol => Self {
                kind,
                damage: 12.0,
                range: 300.0,
                spread: 0.0,
                magazine: 12,
                magazine_size: 12,
            },
            WeaponKind::Rifle => Self {
                kind,
                damage: 20.0,
                range: 500.0,
                spread: 0.0,
                magazine: 30,
                magazine_size: 30,
            },
            WeaponKind::Shotgun => Self {
                kind,
                damage: 8.0,
                range: 150.0,
                spread: 30.0,
                magazine: 6,
                magazine_size: 6,
            },
        }
    }

    /// Attempts to fire: spends one round and returns the ranged action, or
    /// reports the trigger blocked on an empty magazine.
    pub fn fire(&mut self) -> FireAction {
        if self.magazine == 0 {
            return FireAction::Blocked;
        }
        self.magazine -= 1;
        FireAction::Ranged {
            damage: self.damage,
            range: self.range,
            spread: self.spread,
        }
    }

    /// Tops up the magazine from `reserve`, which is decremented by the
    /// number of rounds moved.
    pub fn reload_from(&mut self, reserve: &mut u32) -> ReloadOutcome {
        if self.magazine == self.magazine_size {
            return ReloadOutcome::MagazineFull;
        }
        if *reserve == 0 {
            return ReloadOutcome::NoAmmo;
        }
        let moved = (self.magazine_size - self.magazine).min(*reserve);
        self.magazine += moved;
        *reserve -= moved;
        ReloadOutcome::Reloaded(moved)
    }
}

/// What pulling the trigger produced, before any ray is cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireAction {
    /// A round was spent; cast rays with these parameters.
    Ranged {
        /// Damage per connecting ray.
        damage: f32,
        /// Maximum ray length.
        range: f32,
        /// Total fan angle in degrees.
        spread: f32,
    },
    /// No weapon in hand; swing bare-handed.
    Melee {
        /// Swing damage.
        damage: f32,
        /// Swing reach.
        range: f32,
    },
    /// Magazine empty; nothing happened.
    Blocked,
}

/// Result of a reload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// This many rounds moved from reserve into the magazine.
    Reloaded(u32),
    /// Magazine was already full.
    MagazineFull,
    /// Reserve is empty.
    NoAmmo,
    /// The player has no weapon equipped.
    NoWeapon,
}

/// A player's carried equipment and score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Loadout {
    /// First weapon slot; the active weapon when filled.
    pub primary: Option<Weapon>,
    /// Second weapon slot.
    pub secondary: Option<Weapon>,
    /// Shared ammo reserve.
    pub reserve_ammo: u32,
    /// Confirmed player kills.
    pub kills: u32,
}

impl Loadout {
    /// Stores `weapon` in the first free slot. Returns the weapon back when
    /// both slots are occupied.
    pub fn equip(&mut self, weapon: Weapon) -> Result<(), Weapon> {
        if self.primary.is_none() {
            self.primary = Some(weapon);
            Ok(())
        } else if self.secondary.is_none() {
            self.secondary = Some(weapon);
            Ok(())
        } else {
            Err(weapon)
        }
    }

    /// Adds rounds to the reserve. Returns `false` without changing anything
    /// when the reserve is already at [`RESERVE_CAP`].
    pub fn stash_ammo(&mut self, rounds: u32) -> bool {
        if self.reserve_ammo >= RESERVE_CAP {
            return false;
        }
        self.reserve_ammo = (self.reserve_ammo + rounds).min(RESERVE_CAP);
        true
    }

    /// The active weapon: primary if present, otherwise secondary.
    pub fn current_weapon_mut(&mut self) -> Option<&mut Weapon> {
        self.primary.as_mut().or(self.secondary.as_mut())
    }

    /// Removes and returns the active weapon, promoting the secondary into
    /// the primary slot.
    pub fn unequip(&mut self) -> Option<Weapon> {
        let dropped = self.primary.take();
        if dropped.is_some() {
            self.primary = self.secondary.take();
            dropped
        } else {
            self.secondary.take()
        }
    }

    /// Increments the kill counter.
    pub fn record_kill(&mut self) {
        self.kills += 1;
    }
}

/// Everything that can lie on the ground as a pickup payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    /// A weapon, with whatever is left in its magazine.
    Weapon(Weapon),
    /// Loose rounds for the reserve.
    Ammo {
        /// Rounds contained.
        rounds: u32,
    },
    /// Restores health on acquire.
    Medkit {
        /// Health restored.
        heal: f32,
    },
    /// Charges the shield on acquire.
    ShieldCell {
        /// Shield charge granted.
        charge: f32,
    },
}

impl ItemKind {
    /// Coarse classification reported to the caller of a pickup.
    #[must_use]
    pub const fn category(&self) -> ItemCategory {
        match self {
            Self::Weapon(_) => ItemCategory::Weapon,
            Self::Ammo { .. } => ItemCategory::Ammo,
            Self::Medkit { .. } => ItemCategory::Health,
            Self::ShieldCell { .. } => ItemCategory::Shield,
        }
    }
}

/// Coarse item classification, used as the pickup result.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// A weapon.
    Weapon,
    /// Reserve ammo.
    Ammo,
    /// A health consumable.
    Health,
    /// A shield consumable.
    Shield,
}
