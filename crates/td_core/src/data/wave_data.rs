//! Wave schedule data structures.

use serde::{Deserialize, Serialize};

/// One spawn group inside a wave: `count` enemies of one archetype,
/// `spawn_interval` seconds apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnData {
    /// Enemy archetype id.
    pub enemy_type: String,
    /// Number of enemies to spawn.
    pub count: u32,
    /// Seconds between consecutive spawns.
    pub spawn_interval: f64,
}

/// An ordered list of spawn groups that run concurrently.
///
/// # Example RON
///
/// ```ron
/// (
///     number: 1,
///     spawns: [(enemy_type: "goblin", count: 5, spawn_interval: 1.5)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveData {
    /// Human-facing wave number (1-based).
    pub number: u32,
    /// Spawn groups, all started together when the wave begins.
    pub spawns: Vec<SpawnData>,
}

impl WaveData {
    /// Total number of enemies the wave will spawn.
    #[must_use]
    pub fn total_spawns(&self) -> u32 {
        self.spawns
            .iter()
            .fold(0u32, |acc, spawn| acc.saturating_add(spawn.count))
    }

    /// Collect shape problems with this wave (not including id references).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.number == 0 {
            errors.push("Wave number must be > 0".to_string());
        }
        if self.spawns.is_empty() {
            errors.push(format!("Wave {} must contain at least one spawn", self.number));
        }
        for spawn in &self.spawns {
            if spawn.count == 0 {
                errors.push(format!(
                    "Wave {} spawn of '{}' must have count > 0",
                    self.number, spawn.enemy_type
                ));
            }
            if !spawn.spawn_interval.is_finite() || spawn.spawn_interval <= 0.0 {
                errors.push(format!(
                    "Wave {} spawn of '{}' must have spawn_interval > 0, got {}",
                    self.number, spawn.enemy_type, spawn.spawn_interval
                ));
            }
        }

        errors
    }
}
