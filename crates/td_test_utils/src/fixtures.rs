//! Test fixtures and helpers.
//!
//! Pre-built levels and match states for consistent testing.

use td_core::data::{
    DamageTowerData, EnemyData, LevelConfig, MapData, PointData, SlowTowerData, SpawnData,
    TowerData, WaveData,
};
use td_core::match_state::MatchState;
use td_core::rules::MatchRules;

/// The standard goblin: 100 hp, speed 60, reward 10, no slow resistance.
#[must_use]
pub fn goblin() -> EnemyData {
    EnemyData {
        id: "goblin".to_string(),
        name: "Goblin".to_string(),
        hp: 100,
        speed: 60.0,
        reward: 10,
        slow_resistance: 0.0,
    }
}

/// The standard archer: 25 damage, 1 shot/s, range 120, cost 50.
#[must_use]
pub fn archer() -> TowerData {
    TowerData::Damage(DamageTowerData {
        id: "archer".to_string(),
        name: "Archer Tower".to_string(),
        damage: 25,
        attack_speed: 1.0,
        range: 120.0,
        cost: 50,
    })
}

/// The standard ziggurat: 40% slow for 2s, range 150, cost 70.
#[must_use]
pub fn ziggurat() -> TowerData {
    TowerData::Slow(SlowTowerData {
        id: "ziggurat".to_string(),
        name: "Ziggurat of Slow".to_string(),
        slow_percent: 0.4,
        slow_duration: 2.0,
        range: 150.0,
        cost: 70,
    })
}

/// A wave of `count` goblins, `interval` seconds apart.
#[must_use]
pub fn goblin_wave(number: u32, count: u32, interval: f64) -> WaveData {
    WaveData {
        number,
        spawns: vec![SpawnData {
            enemy_type: "goblin".to_string(),
            count,
            spawn_interval: interval,
        }],
    }
}

fn points(raw: &[(f64, f64)]) -> Vec<PointData> {
    raw.iter().map(|&(x, y)| PointData { x, y }).collect()
}

/// The built-in "Green Plains" level.
///
/// 800x600 map with a five-segment route, goblins, an archer and a
/// ziggurat, and two waves (5 then 8 goblins).
#[must_use]
pub fn green_plains() -> LevelConfig {
    LevelConfig {
        id: 1,
        name: "Green Plains".to_string(),
        start_gold: 100,
        lives: 10,
        map: MapData {
            width: 800.0,
            height: 600.0,
            path: points(&[
                (0.0, 250.0),
                (200.0, 250.0),
                (200.0, 100.0),
                (600.0, 100.0),
                (600.0, 400.0),
                (800.0, 400.0),
            ]),
        },
        enemy_types: vec![goblin()],
        tower_types: vec![archer(), ziggurat()],
        waves: vec![goblin_wave(1, 5, 1.5), goblin_wave(2, 8, 1.2)],
        rules: MatchRules::default(),
    }
}

/// Green Plains with two archers already placed on the route's inner bends.
///
/// # Panics
///
/// Panics if the fixture level is broken.
#[must_use]
pub fn defended_green_plains() -> MatchState {
    let mut state = MatchState::new(&green_plains()).expect("fixture level is valid");
    state
        .place_tower_at("archer", 230.0, 180.0)
        .expect("first archer placement is valid");
    state
        .place_tower_at("archer", 570.0, 250.0)
        .expect("second archer placement is valid");
    state
}

/// A straight 400-unit lane with one wave of `count` goblins.
///
/// 100 start gold, the standard archer, no first-wave delay.
#[must_use]
pub fn single_lane(lives: u32, count: u32) -> LevelConfig {
    LevelConfig {
        id: 100,
        name: "Single Lane".to_string(),
        start_gold: 100,
        lives,
        map: MapData {
            width: 400.0,
            height: 300.0,
            path: points(&[(0.0, 100.0), (400.0, 100.0)]),
        },
        enemy_types: vec![goblin()],
        tower_types: vec![archer()],
        waves: vec![goblin_wave(1, count, 1.0)],
        rules: MatchRules {
            first_wave_delay: 0.0,
            ..MatchRules::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_levels_are_valid() {
        for level in [green_plains(), single_lane(1, 1), single_lane(10, 5)] {
            let errors = level.validate();
            assert!(errors.is_empty(), "{}: {errors:?}", level.name);
        }
    }

    #[test]
    fn test_defended_fixture_spends_all_gold() {
        let state = defended_green_plains();
        assert_eq!(state.towers().len(), 2);
        assert_eq!(state.gold(), 0);
    }
}
