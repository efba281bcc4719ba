//! Level data structure combining the map, archetypes and wave schedule.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::enemy_data::EnemyData;
use super::tower_data::TowerData;
use super::wave_data::WaveData;
use crate::error::{GameError, Result};
use crate::math::{to_fixed, Vec2Fixed};
use crate::rules::MatchRules;

/// Authored route point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    /// X coordinate in map units.
    pub x: f64,
    /// Y coordinate in map units.
    pub y: f64,
}

impl PointData {
    /// Convert to a fixed-point map position.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`] if a coordinate is not
    /// representable.
    pub fn to_fixed(self) -> Result<Vec2Fixed> {
        Ok(Vec2Fixed::new(
            to_fixed(self.x, "path point x")?,
            to_fixed(self.y, "path point y")?,
        ))
    }
}

/// Map dimensions and the route units walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    /// Map width in map units.
    pub width: f64,
    /// Map height in map units.
    pub height: f64,
    /// Ordered route points, from spawn to exit.
    pub path: Vec<PointData>,
}

/// Complete level definition.
///
/// Field names follow the level JSON served to the game client, so the same
/// files load here unchanged. Levels may also be authored in RON.
///
/// # Example RON
///
/// ```ron
/// (
///     id: 1,
///     name: "Green Plains",
///     start_gold: 100,
///     lives: 10,
///     map: (width: 800.0, height: 600.0, path: [(x: 0.0, y: 250.0), ...]),
///     enemy_types: [...],
///     tower_types: [...],
///     waves: [...],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level identifier.
    pub id: u32,

    /// Display name.
    pub name: String,

    /// Gold available at match start.
    pub start_gold: u32,

    /// Lives available at match start.
    pub lives: u32,

    /// Map and route.
    pub map: MapData,

    /// Enemy archetypes referenced by waves.
    pub enemy_types: Vec<EnemyData>,

    /// Tower archetypes available for placement.
    pub tower_types: Vec<TowerData>,

    /// Waves, played in order.
    pub waves: Vec<WaveData>,

    /// Match tuning; omitted fields use the defaults.
    #[serde(default)]
    pub rules: MatchRules,
}

/// Text format of a level file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFormat {
    /// Rusty Object Notation.
    Ron,
    /// JSON, as produced by the level editor.
    Json,
}

impl LevelFormat {
    /// Pick the format from a file extension (`ron` or `json`).
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "ron" => Some(Self::Ron),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Pick the format from the extension of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }
}

impl LevelConfig {
    /// Parse level text in the given format, without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`] if the text does not describe
    /// a level.
    pub fn parse(text: &str, format: LevelFormat) -> Result<Self> {
        match format {
            LevelFormat::Ron => Self::from_ron_str(text),
            LevelFormat::Json => Self::from_json_str(text),
        }
    }

    /// Parse a level from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`] if the text does not describe
    /// a level.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::InvalidLevelShape(e.to_string()))
    }

    /// Parse a level from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`] if the text does not describe
    /// a level.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GameError::InvalidLevelShape(e.to_string()))
    }

    /// Serialize the level to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::InvalidState(e.to_string()))
    }

    /// Find an enemy archetype by id.
    #[must_use]
    pub fn get_enemy(&self, id: &str) -> Option<&EnemyData> {
        self.enemy_types.iter().find(|e| e.id == id)
    }

    /// Find a tower archetype by id.
    #[must_use]
    pub fn get_tower(&self, id: &str) -> Option<&TowerData> {
        self.tower_types.iter().find(|t| t.id() == id)
    }

    /// Total enemies across every wave.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.waves
            .iter()
            .fold(0u32, |acc, wave| acc.saturating_add(wave.total_spawns()))
    }

    /// Validate the shape and internal references of the level.
    ///
    /// Checks for:
    /// - Positive map dimensions and a usable route
    /// - Field ranges of every archetype and wave
    /// - Unique enemy and tower ids
    /// - Spawn groups that reference known enemies
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.map.width.is_finite() || self.map.width <= 0.0 {
            errors.push(format!("Map width must be > 0, got {}", self.map.width));
        }
        if !self.map.height.is_finite() || self.map.height <= 0.0 {
            errors.push(format!("Map height must be > 0, got {}", self.map.height));
        }
        if self.map.path.len() < 2 {
            errors.push(format!(
                "Map path must have at least 2 points, got {}",
                self.map.path.len()
            ));
        } else if let Err(e) = self.route_points().and_then(|p| crate::path::PathProfile::new(&p)) {
            errors.push(e.to_string());
        }

        if self.lives == 0 {
            errors.push("Lives must be > 0".to_string());
        }

        let mut enemy_ids = HashSet::new();
        for enemy in &self.enemy_types {
            if !enemy_ids.insert(enemy.id.as_str()) {
                errors.push(format!("Duplicate enemy id '{}'", enemy.id));
            }
            errors.extend(enemy.validate());
        }

        let mut tower_ids = HashSet::new();
        for tower in &self.tower_types {
            if !tower_ids.insert(tower.id()) {
                errors.push(format!("Duplicate tower id '{}'", tower.id()));
            }
            errors.extend(tower.validate());
        }

        for wave in &self.waves {
            errors.extend(wave.validate());
            for spawn in &wave.spawns {
                if !enemy_ids.contains(spawn.enemy_type.as_str()) {
                    errors.push(format!(
                        "Unknown enemy_type '{}' in wave {}",
                        spawn.enemy_type, wave.number
                    ));
                }
            }
        }

        errors.extend(self.rules.validate());

        errors
    }

    /// Validate the level, folding every issue into one error.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`] listing all issues found by
    /// [`validate`](Self::validate).
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GameError::InvalidLevelShape(errors.join("; ")))
        }
    }

    /// Route points converted to fixed-point.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevelShape`] if a coordinate is not
    /// representable.
    pub fn route_points(&self) -> Result<Vec<Vec2Fixed>> {
        self.map.path.iter().map(|p| p.to_fixed()).collect()
    }
}
