//! Enemy data structures for data-driven enemy definitions.

use serde::{Deserialize, Serialize};

/// Data-driven enemy archetype.
///
/// # Example RON
///
/// ```ron
/// (
///     id: "goblin",
///     name: "Goblin",
///     hp: 100,
///     speed: 60.0,
///     reward: 10,
///     slow_resistance: 0.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyData {
    /// Unique string identifier referenced by wave spawn groups.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Maximum hit points.
    pub hp: u32,

    /// Base movement speed in map units per second.
    pub speed: f64,

    /// Gold (and score) granted when killed.
    pub reward: u32,

    /// Fraction of incoming slow that is ignored, in `[0, 1]`.
    #[serde(default)]
    pub slow_resistance: f64,
}

impl EnemyData {
    /// Collect shape problems with this archetype.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.hp == 0 {
            errors.push(format!("Enemy '{}' must have hp > 0", self.id));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            errors.push(format!(
                "Enemy '{}' speed must be a finite number >= 0, got {}",
                self.id, self.speed
            ));
        }
        if !(0.0..=1.0).contains(&self.slow_resistance) {
            errors.push(format!(
                "Enemy '{}' slow_resistance must be within [0, 1], got {}",
                self.id, self.slow_resistance
            ));
        }

        errors
    }
}
