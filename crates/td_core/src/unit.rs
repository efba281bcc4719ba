//! Enemy units: health, slow effects and movement along the route.
//!
//! A unit is either alive, dead (killed by a tower) or escaped (reached the
//! end of the route). Both terminal states take it out of play; the match
//! tells them apart for accounting.

use serde::{Deserialize, Serialize};

use crate::archetype::EnemyArchetype;
use crate::math::{clamp_fixed, Fixed, Vec2Fixed};
use crate::path::PathProfile;

/// Strongest slow any unit can be under (0.9 as raw `I32F32` bits).
pub const MAX_SLOW_STRENGTH: Fixed = Fixed::from_bits(3_865_470_566);

/// Handle of a spawned unit. Assigned in spawn order, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct UnitId(pub u32);

/// Lifecycle state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// In play.
    Alive,
    /// Hit points reached zero.
    Dead,
    /// Reached the end of the route.
    Escaped,
}

/// Active slow on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlowEffect {
    /// Fraction of speed removed, in `[0, MAX_SLOW_STRENGTH]`.
    pub strength: Fixed,
    /// Seconds until the slow expires.
    pub remaining: Fixed,
}

/// A unit walking the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    archetype: usize,
    health: u32,
    max_health: u32,
    base_speed: Fixed,
    slow_resistance: Fixed,
    reward: u32,
    distance: Fixed,
    position: Vec2Fixed,
    status: UnitStatus,
    slow: SlowEffect,
}

impl Unit {
    /// Spawn a unit at the start of `path`.
    ///
    /// `archetype` is the index of `stats` in the match's enemy table.
    #[must_use]
    pub fn spawn(id: UnitId, archetype: usize, stats: &EnemyArchetype, path: &PathProfile) -> Self {
        Self {
            id,
            archetype,
            health: stats.max_health,
            max_health: stats.max_health,
            base_speed: stats.speed,
            slow_resistance: stats.slow_resistance,
            reward: stats.reward,
            distance: Fixed::ZERO,
            position: path.start(),
            status: UnitStatus::Alive,
            slow: SlowEffect::default(),
        }
    }

    /// Unit handle.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Index into the match's enemy archetype table.
    #[must_use]
    pub const fn archetype(&self) -> usize {
        self.archetype
    }

    /// Current hit points.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Hit points at spawn.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Remaining health as a fraction of max, for HUD bars.
    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        if self.max_health == 0 {
            0.0
        } else {
            f64::from(self.health) / f64::from(self.max_health)
        }
    }

    /// Gold granted when killed.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Distance travelled along the route.
    #[must_use]
    pub const fn distance(&self) -> Fixed {
        self.distance
    }

    /// Current map position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> UnitStatus {
        self.status
    }

    /// Whether the unit is still in play.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == UnitStatus::Alive
    }

    /// Active slow.
    #[must_use]
    pub const fn slow(&self) -> SlowEffect {
        self.slow
    }

    /// Speed after the active slow.
    #[must_use]
    pub fn effective_speed(&self) -> Fixed {
        self.base_speed * (Fixed::ONE - self.slow.strength)
    }

    /// Apply a slow of `fraction` lasting `duration` seconds.
    ///
    /// The strongest slow wins: the resistance-adjusted strength only replaces
    /// the current one if it is strictly greater. The remaining duration is
    /// extended to `duration` whenever that is longer, even if the strength
    /// was not replaced.
    pub fn apply_slow(&mut self, fraction: Fixed, duration: Fixed) {
        if !self.is_alive() {
            return;
        }

        let effective = clamp_fixed(
            fraction * (Fixed::ONE - self.slow_resistance),
            Fixed::ZERO,
            MAX_SLOW_STRENGTH,
        );
        if effective > self.slow.strength {
            self.slow.strength = effective;
        }
        self.slow.remaining = self.slow.remaining.max(duration);
    }

    /// Advance along `path` by `dt` seconds.
    ///
    /// Returns `true` on the tick the unit reaches the end of the route; the
    /// unit is then [`UnitStatus::Escaped`] and later calls return `false`.
    pub fn advance(&mut self, dt: Fixed, path: &PathProfile) -> bool {
        if !self.is_alive() {
            return false;
        }

        if self.slow.remaining > Fixed::ZERO {
            self.slow.remaining -= dt;
            if self.slow.remaining <= Fixed::ZERO {
                self.slow = SlowEffect::default();
            }
        } else {
            self.slow.strength = Fixed::ZERO;
        }

        let step = self.effective_speed().saturating_mul(dt);
        self.distance = self
            .distance
            .saturating_add(step)
            .min(path.total_length());

        let sample = path.position_at_distance(self.distance);
        self.position = sample.position;
        if sample.reached_end {
            self.status = UnitStatus::Escaped;
        }
        sample.reached_end
    }

    /// Subtract `amount` hit points, clamping at zero.
    ///
    /// Returns `true` only if this call killed the unit. Damage to a unit that
    /// is no longer alive does nothing.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.status = UnitStatus::Dead;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path(length: i32) -> PathProfile {
        PathProfile::new(&[Vec2Fixed::ZERO, Vec2Fixed::from_ints(length, 0)]).unwrap()
    }

    fn goblin(resistance: f64) -> EnemyArchetype {
        EnemyArchetype {
            id: "goblin".to_string(),
            name: "Goblin".to_string(),
            max_health: 100,
            speed: Fixed::from_num(60),
            reward: 10,
            slow_resistance: Fixed::from_num(resistance),
        }
    }

    fn spawn(resistance: f64) -> (Unit, PathProfile) {
        let path = straight_path(600);
        (Unit::spawn(UnitId(0), 0, &goblin(resistance), &path), path)
    }

    #[test]
    fn test_spawn_at_route_start() {
        let (unit, path) = spawn(0.0);
        assert_eq!(unit.position(), path.start());
        assert_eq!(unit.distance(), Fixed::ZERO);
        assert!(unit.is_alive());
        assert_eq!(unit.health_fraction(), 1.0);
    }

    #[test]
    fn test_slow_max_wins() {
        let (mut unit, _) = spawn(0.0);
        unit.apply_slow(Fixed::from_num(0.3), Fixed::from_num(2));
        unit.apply_slow(Fixed::from_num(0.2), Fixed::from_num(5));

        assert_eq!(unit.slow().strength, Fixed::from_num(0.3));
        assert!(unit.slow().remaining >= Fixed::from_num(5));
    }

    #[test]
    fn test_slow_refresh_keeps_strength() {
        let (mut unit, _) = spawn(0.0);
        unit.apply_slow(Fixed::from_num(0.1), Fixed::from_num(1));
        unit.apply_slow(Fixed::from_num(0.05), Fixed::from_num(10));

        assert_eq!(unit.slow().strength, Fixed::from_num(0.1));
        assert_eq!(unit.slow().remaining, Fixed::from_num(10));
    }

    #[test]
    fn test_slow_resistance_and_cap() {
        let (mut resistant, _) = spawn(0.5);
        resistant.apply_slow(Fixed::from_num(0.5), Fixed::ONE);
        assert_eq!(resistant.slow().strength, Fixed::from_num(0.25));

        let (mut plain, _) = spawn(0.0);
        plain.apply_slow(Fixed::ONE, Fixed::ONE);
        assert_eq!(plain.slow().strength, MAX_SLOW_STRENGTH);
    }

    #[test]
    fn test_slowed_movement_and_expiry() {
        let (mut unit, path) = spawn(0.0);
        unit.apply_slow(Fixed::from_num(0.5), Fixed::ONE);

        // Half speed for the first second.
        unit.advance(Fixed::from_num(0.5), &path);
        assert_eq!(unit.distance(), Fixed::from_num(15));

        // Slow expires at the start of this step; full speed applies.
        unit.advance(Fixed::from_num(0.5), &path);
        assert_eq!(unit.slow(), SlowEffect::default());
        assert_eq!(unit.distance(), Fixed::from_num(45));
    }

    #[test]
    fn test_advance_reports_escape_once() {
        let path = straight_path(60);
        let mut unit = Unit::spawn(UnitId(1), 0, &goblin(0.0), &path);

        assert!(!unit.advance(Fixed::from_num(0.5), &path));
        assert!(unit.advance(Fixed::from_num(0.5), &path));
        assert_eq!(unit.status(), UnitStatus::Escaped);
        assert_eq!(unit.distance(), path.total_length());
        assert!(!unit.advance(Fixed::ONE, &path));
    }

    #[test]
    fn test_distance_is_monotonic_and_clamped() {
        let (mut unit, path) = spawn(0.0);
        let mut previous = unit.distance();
        for _ in 0..400 {
            unit.advance(Fixed::from_num(0.05), &path);
            assert!(unit.distance() >= previous);
            assert!(unit.distance() <= path.total_length());
            previous = unit.distance();
        }
    }

    #[test]
    fn test_exact_lethal_damage() {
        let (mut unit, _) = spawn(0.0);
        assert!(!unit.apply_damage(99));
        assert!(unit.apply_damage(1));
        assert_eq!(unit.health(), 0);
        assert_eq!(unit.status(), UnitStatus::Dead);
        assert!(!unit.apply_damage(25));
    }

    #[test]
    fn test_overkill_clamps_at_zero() {
        let (mut unit, _) = spawn(0.0);
        assert!(unit.apply_damage(1_000));
        assert_eq!(unit.health(), 0);
        assert_eq!(unit.health_fraction(), 0.0);
    }

    #[test]
    fn test_dead_unit_ignores_slow_and_movement() {
        let (mut unit, path) = spawn(0.0);
        unit.apply_damage(100);
        unit.apply_slow(Fixed::from_num(0.5), Fixed::ONE);
        assert_eq!(unit.slow(), SlowEffect::default());
        assert!(!unit.advance(Fixed::ONE, &path));
        assert_eq!(unit.distance(), Fixed::ZERO);
    }
}
