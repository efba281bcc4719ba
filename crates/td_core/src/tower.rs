//! Placed towers and their per-tick effects.
//!
//! Towers never touch match-wide state. An attacker reports its [`Shot`] and
//! the match turns a kill into gold and score; a slower just slows.

use serde::{Deserialize, Serialize};

use crate::archetype::{TowerArchetype, TowerKind, TowerKindTag};
use crate::math::{square_wide, Fixed, Vec2Fixed};
use crate::unit::{Unit, UnitId};

/// Handle of a placed tower. Assigned in placement order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TowerId(pub u32);

/// Variant-specific runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TowerBehavior {
    /// Single-target shooter.
    Attacker {
        /// Damage per shot.
        damage: u32,
        /// Cooldown applied after each shot.
        cooldown_period: Fixed,
        /// Seconds until the next shot; zero means ready.
        cooldown: Fixed,
    },
    /// Area slow with no runtime state.
    Slower {
        /// Slow fraction applied.
        fraction: Fixed,
        /// Slow duration applied.
        duration: Fixed,
    },
}

/// Outcome of an attacker firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    /// Unit that was hit.
    pub target: UnitId,
    /// Index of the target in the unit slice passed to [`Tower::attack`].
    pub target_index: usize,
    /// Tower position.
    pub from: Vec2Fixed,
    /// Target position at the moment of the shot.
    pub to: Vec2Fixed,
    /// Whether this shot killed the target.
    pub killed: bool,
}

/// A placed tower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tower {
    id: TowerId,
    archetype: usize,
    position: Vec2Fixed,
    range: Fixed,
    /// `range²` in the units of [`Vec2Fixed::distance_squared`].
    range_squared: u128,
    behavior: TowerBehavior,
}

impl Tower {
    /// Create a tower of `stats` at `position`.
    ///
    /// `fallback_cooldown` is used as the shot period of an attacker whose
    /// attack rate is zero.
    #[must_use]
    pub fn new(
        id: TowerId,
        archetype: usize,
        stats: &TowerArchetype,
        position: Vec2Fixed,
        fallback_cooldown: Fixed,
    ) -> Self {
        let behavior = match stats.kind {
            TowerKind::Attacker {
                damage,
                attack_rate,
            } => {
                let cooldown_period = if attack_rate > Fixed::ZERO {
                    Fixed::ONE.checked_div(attack_rate).unwrap_or(fallback_cooldown)
                } else {
                    fallback_cooldown
                };
                TowerBehavior::Attacker {
                    damage,
                    cooldown_period,
                    cooldown: Fixed::ZERO,
                }
            }
            TowerKind::Slower { fraction, duration } => TowerBehavior::Slower { fraction, duration },
        };

        Self {
            id,
            archetype,
            position,
            range: stats.range,
            range_squared: square_wide(stats.range),
            behavior,
        }
    }

    /// Tower handle.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Index into the match's tower archetype table.
    #[must_use]
    pub const fn archetype(&self) -> usize {
        self.archetype
    }

    /// Map position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Effect radius.
    #[must_use]
    pub const fn range(&self) -> Fixed {
        self.range
    }

    /// Runtime state.
    #[must_use]
    pub const fn behavior(&self) -> TowerBehavior {
        self.behavior
    }

    /// Variant tag.
    #[must_use]
    pub const fn kind(&self) -> TowerKindTag {
        match self.behavior {
            TowerBehavior::Attacker { .. } => TowerKindTag::Attacker,
            TowerBehavior::Slower { .. } => TowerKindTag::Slower,
        }
    }

    /// Whether `unit` is alive and inside the effect radius (inclusive).
    #[must_use]
    pub fn in_range(&self, unit: &Unit) -> bool {
        unit.is_alive() && self.position.distance_squared(unit.position()) <= self.range_squared
    }

    /// Run an attacker for one tick of `dt` seconds.
    ///
    /// Ticks the cooldown down; once ready, shoots the nearest live unit in
    /// range. Equidistant candidates resolve to the first in `units`, which the
    /// match keeps in spawn order. With nothing in range the tower stays ready.
    /// Slower towers never shoot.
    pub fn attack(&mut self, dt: Fixed, units: &mut [Unit]) -> Option<Shot> {
        let TowerBehavior::Attacker {
            damage,
            cooldown_period,
            ref mut cooldown,
        } = self.behavior
        else {
            return None;
        };

        *cooldown = (*cooldown - dt).max(Fixed::ZERO);
        if *cooldown > Fixed::ZERO {
            return None;
        }

        let mut best: Option<(usize, u128)> = None;
        for (index, unit) in units.iter().enumerate() {
            if !unit.is_alive() {
                continue;
            }
            let d2 = self.position.distance_squared(unit.position());
            if d2 > self.range_squared {
                continue;
            }
            if best.map_or(true, |(_, best_d2)| d2 < best_d2) {
                best = Some((index, d2));
            }
        }

        let (target_index, _) = best?;
        *cooldown = cooldown_period;

        let target = &mut units[target_index];
        let killed = target.apply_damage(damage);
        Some(Shot {
            target: target.id(),
            target_index,
            from: self.position,
            to: target.position(),
            killed,
        })
    }

    /// Run a slower for one tick: slow every live unit in range.
    ///
    /// Returns how many units were slowed. Attacker towers slow nothing.
    pub fn apply_aura(&self, units: &mut [Unit]) -> usize {
        let TowerBehavior::Slower { fraction, duration } = self.behavior else {
            return 0;
        };

        let mut slowed = 0;
        for unit in units.iter_mut() {
            if self.in_range(unit) {
                unit.apply_slow(fraction, duration);
                slowed += 1;
            }
        }
        slowed
    }
}
