//! Arena tuning parameters.

use serde::{Deserialize, Serialize};

use crate::hazard::HazardConfig;

/// Static tuning for an arena instance.
///
/// `base_speed` is the distance a full-magnitude move request covers under a
/// pace multiplier of 1.0; the effective step is clamped into
/// `[step_min, step_max]` after the hazard pace is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Arena width in world units.
    pub width: f32,
    /// Arena height in world units.
    pub height: f32,
    /// Step length at pace 1.0.
    pub base_speed: f32,
    /// Lower clamp on the effective step length.
    pub step_min: f32,
    /// Upper clamp on the effective step length.
    pub step_max: f32,
    /// Hazard ring tuning.
    pub hazard: HazardConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            base_speed: 4.0,
            step_min: 1.0,
            step_max: 8.0,
            hazard: HazardConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Applies the pace multiplier and clamps into the configured step range.
    #[must_use]
    pub fn effective_step(&self, pace: f32) -> f32 {
        (self.base_speed * pace).clamp(self.step_min, self.step_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_step_is_clamped() {
        let config = ArenaConfig::default();
        assert!((config.effective_step(1.0) - 4.0).abs() < f32::EPSILON);
        assert!((config.effective_step(10.0) - config.step_max).abs() < f32::EPSILON);
        assert!((config.effective_step(0.0) - config.step_min).abs() < f32::EPSILON);
    }

    #[test]
    fn serialization_roundtrip() {
        let config = ArenaConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ArenaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
