//! Data structures for level configuration.
//!
//! This module contains pure data structures that define a level: the map and
//! its route, enemy archetypes, tower archetypes and the wave schedule. All
//! structs deserialize from RON or JSON, with field names matching the level
//! files served by the level API.
//!
//! **Note:** This module contains no IO - it only parses strings. File
//! loading is handled by `td_headless` and `td_tools`.

mod enemy_data;
mod level_data;
mod tower_data;
mod wave_data;

pub use enemy_data::EnemyData;
pub use level_data::{LevelConfig, LevelFormat, MapData, PointData};
pub use tower_data::{DamageTowerData, SlowTowerData, TowerData};
pub use wave_data::{SpawnData, WaveData};
