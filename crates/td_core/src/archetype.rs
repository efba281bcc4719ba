//! Runtime archetypes resolved from level data.
//!
//! Level files carry decimals; the simulation only ever sees these
//! fixed-point forms. Values are clamped into their legal ranges here so the
//! tick loop never has to re-check them.

use serde::{Deserialize, Serialize};

use crate::data::{EnemyData, TowerData};
use crate::error::Result;
use crate::math::{clamp_fixed, to_fixed, Fixed};

/// Resolved enemy archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyArchetype {
    /// Archetype id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Hit points at spawn.
    pub max_health: u32,
    /// Base speed in map units per second.
    pub speed: Fixed,
    /// Gold and score granted on kill.
    pub reward: u32,
    /// Fraction of incoming slow ignored, in `[0, 1]`.
    pub slow_resistance: Fixed,
}

impl EnemyArchetype {
    /// Resolve from authored data.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`](crate::error::GameError) if a
    /// number cannot be represented.
    pub fn from_data(data: &EnemyData) -> Result<Self> {
        Ok(Self {
            id: data.id.clone(),
            name: data.name.clone(),
            max_health: data.hp,
            speed: to_fixed(data.speed, "enemy speed")?.max(Fixed::ZERO),
            reward: data.reward,
            slow_resistance: clamp_fixed(
                to_fixed(data.slow_resistance, "enemy slow_resistance")?,
                Fixed::ZERO,
                Fixed::ONE,
            ),
        })
    }
}

/// Tower variant, as a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TowerKind {
    /// Shoots the nearest unit in range.
    Attacker {
        /// Damage per shot.
        damage: u32,
        /// Shots per second; zero falls back to the rules' cooldown.
        attack_rate: Fixed,
    },
    /// Slows every unit in range, every tick.
    Slower {
        /// Slow fraction, in `[0, 1]`.
        fraction: Fixed,
        /// Seconds the slow lasts.
        duration: Fixed,
    },
}

/// Serializable tag for a [`TowerKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKindTag {
    /// Damage tower.
    Attacker,
    /// Slow tower.
    Slower,
}

impl TowerKind {
    /// Tag without the stats.
    #[must_use]
    pub const fn tag(&self) -> TowerKindTag {
        match self {
            Self::Attacker { .. } => TowerKindTag::Attacker,
            Self::Slower { .. } => TowerKindTag::Slower,
        }
    }
}

/// Resolved tower archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TowerArchetype {
    /// Archetype id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Effect radius.
    pub range: Fixed,
    /// Gold cost.
    pub cost: u32,
    /// Variant stats.
    pub kind: TowerKind,
}

impl TowerArchetype {
    /// Resolve from authored data.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`](crate::error::GameError) if a
    /// number cannot be represented.
    pub fn from_data(data: &TowerData) -> Result<Self> {
        let kind = match data {
            TowerData::Damage(tower) => TowerKind::Attacker {
                damage: tower.damage,
                attack_rate: to_fixed(tower.attack_speed, "tower attack_speed")?
                    .max(Fixed::ZERO),
            },
            TowerData::Slow(tower) => TowerKind::Slower {
                fraction: clamp_fixed(
                    to_fixed(tower.slow_percent, "tower slow_percent")?,
                    Fixed::ZERO,
                    Fixed::ONE,
                ),
                duration: to_fixed(tower.slow_duration, "tower slow_duration")?
                    .max(Fixed::ZERO),
            },
        };

        Ok(Self {
            id: data.id().to_string(),
            name: data.name().to_string(),
            range: to_fixed(data.range(), "tower range")?.max(Fixed::ZERO),
            cost: data.cost(),
            kind,
        })
    }
}
