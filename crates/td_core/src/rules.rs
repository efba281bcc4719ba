//! Match tuning: placement limits, wave pacing and the simulation step.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::{to_fixed, Fixed};

/// Simulation ticks per second for drivers that use the canonical step.
pub const TICK_RATE: u32 = 20;

/// Length of one canonical tick in seconds.
///
/// Rounded up to the next representable value so that `TICK_RATE` ticks
/// never add up to less than one second.
#[must_use]
pub fn tick_dt() -> Fixed {
    let rate = i64::from(TICK_RATE);
    Fixed::from_bits((Fixed::ONE.to_bits() + rate - 1) / rate)
}

/// Authored match tuning, carried by a level's optional `rules` block.
///
/// Every field has a default, so `rules: ()` and a missing block behave the
/// same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    /// Towers may not be placed within this distance of the route.
    pub no_build_radius: f64,
    /// Minimum distance between two towers.
    pub min_tower_spacing: f64,
    /// Delay before the first wave starts, in seconds.
    pub first_wave_delay: f64,
    /// Delay between one wave completing and the next starting, in seconds.
    pub wave_settle_delay: f64,
    /// Attacker cooldown used when a tower has no usable attack rate.
    pub fallback_attack_cooldown: f64,
    /// Lower bound for a spawn group's interval, in seconds.
    pub min_spawn_interval: f64,
    /// Longest time step a single tick may simulate, in seconds.
    pub max_tick_dt: f64,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            no_build_radius: 24.0,
            min_tower_spacing: 26.0,
            first_wave_delay: 1.5,
            wave_settle_delay: 0.9,
            fallback_attack_cooldown: 0.5,
            min_spawn_interval: 0.05,
            max_tick_dt: 0.05,
        }
    }
}

impl MatchRules {
    /// Collect out-of-range values.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let non_negative = [
            ("no_build_radius", self.no_build_radius),
            ("min_tower_spacing", self.min_tower_spacing),
            ("first_wave_delay", self.first_wave_delay),
            ("wave_settle_delay", self.wave_settle_delay),
        ];
        let positive = [
            ("fallback_attack_cooldown", self.fallback_attack_cooldown),
            ("min_spawn_interval", self.min_spawn_interval),
            ("max_tick_dt", self.max_tick_dt),
        ];

        let mut errors = Vec::new();
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("Rule {name} must be >= 0, got {value}"));
            }
        }
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("Rule {name} must be > 0, got {value}"));
            }
        }
        errors
    }

    /// Convert to the fixed-point form used by the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`](crate::error::GameError) if a
    /// value is not representable.
    pub fn resolve(&self) -> Result<ResolvedRules> {
        Ok(ResolvedRules {
            no_build_radius: to_fixed(self.no_build_radius, "rules.no_build_radius")?,
            min_tower_spacing: to_fixed(self.min_tower_spacing, "rules.min_tower_spacing")?,
            first_wave_delay: to_fixed(self.first_wave_delay, "rules.first_wave_delay")?
                .max(Fixed::ZERO),
            wave_settle_delay: to_fixed(self.wave_settle_delay, "rules.wave_settle_delay")?
                .max(Fixed::ZERO),
            fallback_attack_cooldown: to_fixed(
                self.fallback_attack_cooldown,
                "rules.fallback_attack_cooldown",
            )?,
            min_spawn_interval: to_fixed(self.min_spawn_interval, "rules.min_spawn_interval")?
                .max(Fixed::DELTA),
            max_tick_dt: to_fixed(self.max_tick_dt, "rules.max_tick_dt")?.max(Fixed::DELTA),
        })
    }
}

/// Fixed-point match tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRules {
    /// See [`MatchRules::no_build_radius`].
    pub no_build_radius: Fixed,
    /// See [`MatchRules::min_tower_spacing`].
    pub min_tower_spacing: Fixed,
    /// See [`MatchRules::first_wave_delay`].
    pub first_wave_delay: Fixed,
    /// See [`MatchRules::wave_settle_delay`].
    pub wave_settle_delay: Fixed,
    /// See [`MatchRules::fallback_attack_cooldown`].
    pub fallback_attack_cooldown: Fixed,
    /// See [`MatchRules::min_spawn_interval`].
    pub min_spawn_interval: Fixed,
    /// See [`MatchRules::max_tick_dt`].
    pub max_tick_dt: Fixed,
}
