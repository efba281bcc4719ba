//! Tower data structures for data-driven tower definitions.
//!
//! Towers are a closed set of two kinds, tagged by a `type` field:
//! `"damage"` towers shoot the nearest unit, `"slow"` towers apply a
//! slowing aura to every unit in range.

use serde::{Deserialize, Serialize};

/// Data-driven tower archetype, tagged by `type`.
///
/// # Example JSON
///
/// ```json
/// { "id": "archer", "name": "Archer Tower", "type": "damage",
///   "damage": 25, "attack_speed": 1.0, "range": 120, "cost": 50 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TowerData {
    /// Single-target damage dealer.
    #[serde(rename = "damage")]
    Damage(DamageTowerData),
    /// Area slowing aura.
    #[serde(rename = "slow")]
    Slow(SlowTowerData),
}

/// Stats of a damage ("attacker") tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageTowerData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Damage per shot.
    pub damage: u32,
    /// Shots per second.
    pub attack_speed: f64,
    /// Targeting radius in map units.
    pub range: f64,
    /// Gold cost to place.
    pub cost: u32,
}

/// Stats of a slowing ("slower") tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowTowerData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Fraction of speed removed, in `(0, 1]`.
    pub slow_percent: f64,
    /// Seconds the slow lingers after leaving the aura.
    pub slow_duration: f64,
    /// Aura radius in map units.
    pub range: f64,
    /// Gold cost to place.
    pub cost: u32,
}

impl TowerData {
    /// Unique identifier of the tower archetype.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Damage(tower) => &tower.id,
            Self::Slow(tower) => &tower.id,
        }
    }

    /// Display name of the tower archetype.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Damage(tower) => &tower.name,
            Self::Slow(tower) => &tower.name,
        }
    }

    /// Radius in map units.
    #[must_use]
    pub fn range(&self) -> f64 {
        match self {
            Self::Damage(tower) => tower.range,
            Self::Slow(tower) => tower.range,
        }
    }

    /// Gold cost to place.
    #[must_use]
    pub fn cost(&self) -> u32 {
        match self {
            Self::Damage(tower) => tower.cost,
            Self::Slow(tower) => tower.cost,
        }
    }

    /// Collect shape problems with this archetype.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let id = self.id();
        let mut errors = Vec::new();

        if !self.range().is_finite() || self.range() <= 0.0 {
            errors.push(format!("Tower '{id}' range must be > 0, got {}", self.range()));
        }
        if self.cost() == 0 {
            errors.push(format!("Tower '{id}' cost must be > 0"));
        }

        match self {
            Self::Damage(tower) => {
                if tower.damage == 0 {
                    errors.push(format!("Tower '{id}' damage must be > 0"));
                }
                if !tower.attack_speed.is_finite() || tower.attack_speed <= 0.0 {
                    errors.push(format!(
                        "Tower '{id}' attack_speed must be > 0, got {}",
                        tower.attack_speed
                    ));
                }
            }
            Self::Slow(tower) => {
                if !(tower.slow_percent > 0.0 && tower.slow_percent <= 1.0) {
                    errors.push(format!(
                        "Tower '{id}' slow_percent must be within (0, 1], got {}",
                        tower.slow_percent
                    ));
                }
                if !tower.slow_duration.is_finite() || tower.slow_duration <= 0.0 {
                    errors.push(format!(
                        "Tower '{id}' slow_duration must be > 0, got {}",
                        tower.slow_duration
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_json() {
        let json = r#"[
            {"id": "archer", "name": "Archer Tower", "type": "damage",
             "damage": 25, "attack_speed": 1.0, "range": 120, "cost": 50},
            {"id": "ziggurat", "name": "Ziggurat of Slow", "type": "slow",
             "slow_percent": 0.4, "slow_duration": 2.0, "range": 150, "cost": 70}
        ]"#;
        let towers: Vec<TowerData> = serde_json::from_str(json).unwrap();

        assert!(matches!(&towers[0], TowerData::Damage(t) if t.damage == 25));
        assert!(matches!(&towers[1], TowerData::Slow(t) if t.slow_percent == 0.4));
        assert_eq!(towers[1].id(), "ziggurat");
        assert_eq!(towers[0].cost(), 50);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"id": "x", "name": "X", "type": "laser", "range": 1, "cost": 1}"#;
        assert!(serde_json::from_str::<TowerData>(json).is_err());
    }

    #[test]
    fn test_validate_slow_tower_bounds() {
        let tower = TowerData::Slow(SlowTowerData {
            id: "ziggurat".to_string(),
            name: "Ziggurat".to_string(),
            slow_percent: 0.0,
            slow_duration: 0.0,
            range: 150.0,
            cost: 70,
        });
        assert_eq!(tower.validate().len(), 2);
    }

    #[test]
    fn test_validate_damage_tower_bounds() {
        let tower = TowerData::Damage(DamageTowerData {
            id: "archer".to_string(),
            name: "Archer".to_string(),
            damage: 0,
            attack_speed: 1.0,
            range: -5.0,
            cost: 0,
        });
        let errors = tower.validate();
        assert_eq!(errors.len(), 3, "Errors: {errors:?}");
    }
}
